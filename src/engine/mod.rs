// src/engine/mod.rs

//! Orchestration for hotreload.
//!
//! This module ties together:
//! - the watch-set manager (module list, watch table, reload dispatch)
//! - the async event loop that debounces watcher notifications and feeds
//!   them to the manager
//!
//! The manager holds all the semantics; [`runtime`] is a thin IO shell.

use crate::watch::patterns::PatternSet;

pub mod manager;
pub mod runtime;

pub use manager::{Collaborators, WatchSetManager};
pub use runtime::run_event_loop;

/// `Empty` when no module is watched, `Watching` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Empty,
    Watching,
}

/// Notifications for observers (GUI panels, theme managers, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A source module was reloaded in place.
    SourceReloaded { module: String, changed: bool },
    /// A stylesheet changed; the theme should be re-applied.
    StylesheetChanged,
}

/// What handling a single change notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    Reloaded { module: String, changed: bool },
    StylesheetChanged,
    /// Content hash matched the last seen one.
    Unchanged,
    /// The path is not in the watch table.
    NotWatched,
    /// Neither a source file nor a stylesheet.
    Ignored,
    /// Mapping or reload failure; the message was logged.
    Failed(String),
}

/// Construction options for [`WatchSetManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub patterns: PatternSet,
    /// Skip reloads when the file content hash did not change.
    pub use_hash: bool,
    /// Register paths and subscribe to the watcher right away.
    pub auto_connect: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            patterns: PatternSet::default(),
            use_hash: false,
            auto_connect: true,
        }
    }
}
