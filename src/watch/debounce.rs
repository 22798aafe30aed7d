// src/watch/debounce.rs

//! Trailing-edge debouncing of change notifications.
//!
//! Editors often emit several events per save. Each notification resets the
//! timer of its path; the path is released once it has been quiet for the
//! whole window. Intermediate notifications are dropped, not queued.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default quiescence window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Debouncer {
    /// path -> time of the most recent notification
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    /// Record a notification for `path` at `at`, restarting its window.
    pub fn record_at(&mut self, path: PathBuf, at: Instant) {
        self.pending.insert(path, at);
    }

    /// Take every path that has been quiet for at least the window.
    pub fn take_ready_at(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready = Vec::new();
        self.pending.retain(|path, last| {
            if now.saturating_duration_since(*last) >= self.window {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    /// Earliest instant at which some pending path becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().map(|last| *last + self.window)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
