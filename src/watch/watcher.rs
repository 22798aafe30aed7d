// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;

/// Channel on which changed paths are delivered.
pub type ChangeSender = mpsc::UnboundedSender<PathBuf>;
pub type ChangeReceiver = mpsc::UnboundedReceiver<PathBuf>;

/// The file-watch collaborator driven by the watch-set manager.
///
/// Paths are watched individually (files and directories alike). Change
/// notifications only flow once [`FileWatcher::subscribe`] has been called.
pub trait FileWatcher: Send {
    /// Start watching `paths`. Returns the paths that could not be watched.
    fn add_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf>;

    /// Stop watching `paths`. Returns the paths that were not being watched.
    fn remove_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf>;

    /// Files currently watched.
    fn files(&self) -> Vec<PathBuf>;

    /// Directories currently watched.
    fn directories(&self) -> Vec<PathBuf>;

    /// Deliver change notifications to `tx`. Every changed path is sent once
    /// per event no matter how often this is called, so callers should only
    /// subscribe once.
    fn subscribe(&mut self, tx: ChangeSender);
}

/// [`FileWatcher`] backed by the platform watcher from `notify`.
///
/// Dropping it stops all watches.
pub struct NotifyWatcher {
    inner: RecommendedWatcher,
    files: BTreeSet<PathBuf>,
    directories: BTreeSet<PathBuf>,
    sink: Arc<Mutex<Option<ChangeSender>>>,
}

impl fmt::Debug for NotifyWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatcher")
            .field("files", &self.files.len())
            .field("directories", &self.directories.len())
            .finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    pub fn new() -> Result<Self> {
        let sink: Arc<Mutex<Option<ChangeSender>>> = Arc::new(Mutex::new(None));

        // Called synchronously on notify's thread.
        let inner = RecommendedWatcher::new(
            {
                let sink = Arc::clone(&sink);
                move |res: notify::Result<Event>| match res {
                    Ok(event) => forward_event(&sink, event),
                    Err(err) => warn!("file watch error: {err}"),
                }
            },
            Config::default(),
        )?;

        info!("file watcher created");
        Ok(Self {
            inner,
            files: BTreeSet::new(),
            directories: BTreeSet::new(),
            sink,
        })
    }
}

fn forward_event(sink: &Mutex<Option<ChangeSender>>, event: Event) {
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) {
        return;
    }
    let Ok(guard) = sink.lock() else {
        warn!("change sink mutex poisoned; dropping event");
        return;
    };
    let Some(tx) = guard.as_ref() else {
        return;
    };
    for path in event.paths {
        debug!(?path, kind = ?event.kind, "forwarding change");
        if tx.send(path).is_err() {
            debug!("change receiver dropped");
            return;
        }
    }
}

impl FileWatcher for NotifyWatcher {
    fn add_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut failed = Vec::new();
        for path in paths {
            if self.files.contains(path) || self.directories.contains(path) {
                continue;
            }
            match self.inner.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    if path.is_dir() {
                        self.directories.insert(path.clone());
                    } else {
                        self.files.insert(path.clone());
                    }
                }
                Err(err) => {
                    debug!(?path, error = %err, "could not watch path");
                    failed.push(path.clone());
                }
            }
        }
        failed
    }

    fn remove_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        for path in paths {
            let known = self.files.remove(path) | self.directories.remove(path);
            if !known {
                missing.push(path.clone());
                continue;
            }
            // The OS watch is already gone if the file was deleted.
            if let Err(err) = self.inner.unwatch(path) {
                debug!(?path, error = %err, "unwatch failed");
            }
        }
        missing
    }

    fn files(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }

    fn directories(&self) -> Vec<PathBuf> {
        self.directories.iter().cloned().collect()
    }

    fn subscribe(&mut self, tx: ChangeSender) {
        match self.sink.lock() {
            Ok(mut guard) => *guard = Some(tx),
            Err(_) => warn!("change sink mutex poisoned; subscription ignored"),
        }
    }
}
