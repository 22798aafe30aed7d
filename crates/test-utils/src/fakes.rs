#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use hotreload::locate::ModuleLocator;
use hotreload::reload::Reloader;
use hotreload::watch::watcher::{ChangeSender, FileWatcher};

#[derive(Debug, Default)]
struct WatcherState {
    files: BTreeSet<PathBuf>,
    directories: BTreeSet<PathBuf>,
    unwatchable: HashSet<PathBuf>,
    subscriptions: usize,
    sender: Option<ChangeSender>,
    add_calls: usize,
    remove_calls: usize,
}

/// In-memory [`FileWatcher`]. Clones share state, so a test can keep one
/// handle while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeWatcher {
    state: Arc<Mutex<WatcherState>>,
}

impl FakeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `add_paths` reject `path`.
    pub fn refuse(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().unwatchable.insert(path.into());
    }

    /// Drop `path` as the OS does when a file is replaced on save.
    pub fn forget(&self, path: &Path) {
        self.state.lock().unwrap().files.remove(path);
    }

    /// Deliver a change notification, if anyone subscribed.
    pub fn emit(&self, path: impl Into<PathBuf>) -> bool {
        let state = self.state.lock().unwrap();
        match &state.sender {
            Some(tx) => tx.send(path.into()).is_ok(),
            None => false,
        }
    }

    /// Drop the subscriber's sender so the change channel can close.
    pub fn disconnect(&self) {
        self.state.lock().unwrap().sender = None;
    }

    pub fn subscriptions(&self) -> usize {
        self.state.lock().unwrap().subscriptions
    }

    pub fn add_calls(&self) -> usize {
        self.state.lock().unwrap().add_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.state.lock().unwrap().remove_calls
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().files.iter().cloned().collect()
    }
}

impl FileWatcher for FakeWatcher {
    fn add_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut state = self.state.lock().unwrap();
        state.add_calls += 1;
        let mut failed = Vec::new();
        for path in paths {
            if state.unwatchable.contains(path) {
                failed.push(path.clone());
            } else {
                state.files.insert(path.clone());
            }
        }
        failed
    }

    fn remove_paths(&mut self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut state = self.state.lock().unwrap();
        state.remove_calls += 1;
        let mut missing = Vec::new();
        for path in paths {
            let known = state.files.remove(path) | state.directories.remove(path);
            if !known {
                missing.push(path.clone());
            }
        }
        missing
    }

    fn files(&self) -> Vec<PathBuf> {
        self.watched()
    }

    fn directories(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().directories.iter().cloned().collect()
    }

    fn subscribe(&mut self, tx: ChangeSender) {
        let mut state = self.state.lock().unwrap();
        state.subscriptions += 1;
        state.sender = Some(tx);
    }
}

#[derive(Debug, Default)]
struct ReloaderState {
    calls: Vec<String>,
    failing: HashMap<String, String>,
    unchanged: HashSet<String>,
}

/// [`Reloader`] that records requests and answers from a script.
#[derive(Debug, Clone, Default)]
pub struct FakeReloader {
    state: Arc<Mutex<ReloaderState>>,
}

impl FakeReloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reloading `module` fails with `message`.
    pub fn fail_on(&self, module: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(module.to_string(), message.to_string());
    }

    /// Reloading `module` succeeds but reports no change.
    pub fn unchanged(&self, module: &str) {
        self.state.lock().unwrap().unchanged.insert(module.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Reloader for FakeReloader {
    fn reload(&mut self, module: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(module.to_string());
        if let Some(msg) = state.failing.get(module) {
            return Err(anyhow!("{msg}"));
        }
        Ok(!state.unchanged.contains(module))
    }
}

/// [`ModuleLocator`] answering from a fixed map. Clones share the map, so
/// a test can "uninstall" a module after handing the locator over.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    roots: Arc<Mutex<HashMap<String, PathBuf>>>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, module: &str, root: impl Into<PathBuf>) -> Self {
        self.insert(module, root);
        self
    }

    pub fn insert(&self, module: &str, root: impl Into<PathBuf>) {
        self.roots
            .lock()
            .unwrap()
            .insert(module.to_string(), root.into());
    }

    pub fn remove(&self, module: &str) {
        self.roots.lock().unwrap().remove(module);
    }
}

impl ModuleLocator for StaticLocator {
    fn locate(&self, module: &str) -> Option<PathBuf> {
        self.roots.lock().ok()?.get(module).cloned()
    }
}
