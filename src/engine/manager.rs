// src/engine/manager.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::errors::HotreloadError;
use crate::fs::FileSystem;
use crate::locate::{is_valid_module_ref, ModuleLocator};
use crate::logging::LogSink;
use crate::reload::Reloader;
use crate::watch::hash::ContentHashes;
use crate::watch::module_name::path_to_module;
use crate::watch::path_utils::NormalizedPath;
use crate::watch::patterns::{PatternSet, SOURCE_EXTENSION, STYLESHEET_EXTENSION};
use crate::watch::table::{build_watch_table, WatchTable, WatchedModule};
use crate::watch::watcher::{ChangeReceiver, ChangeSender, FileWatcher};

use super::{ChangeOutcome, ManagerOptions, ReloadEvent, WatchState};

const EVENT_CAPACITY: usize = 64;

/// Everything the manager talks to but does not own the logic of.
pub struct Collaborators {
    pub fs: Arc<dyn FileSystem>,
    pub locator: Box<dyn ModuleLocator>,
    pub watcher: Box<dyn FileWatcher>,
    pub reloader: Box<dyn Reloader>,
    pub log: LogSink,
}

/// Owns the watched module list and the watch table, and turns change
/// notifications into reloads.
///
/// All methods are meant to be called from a single event-loop thread.
pub struct WatchSetManager {
    fs: Arc<dyn FileSystem>,
    locator: Box<dyn ModuleLocator>,
    watcher: Box<dyn FileWatcher>,
    reloader: Box<dyn Reloader>,
    log: LogSink,

    patterns: PatternSet,
    modules: Vec<WatchedModule>,
    table: WatchTable,
    hashes: Option<ContentHashes>,

    events: broadcast::Sender<ReloadEvent>,
    /// Handed to the watcher on first subscription; `None` afterwards.
    change_tx: Option<ChangeSender>,
    change_rx: Option<ChangeReceiver>,
}

impl fmt::Debug for WatchSetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSetManager")
            .field("modules", &self.modules)
            .field("watched_paths", &self.table.len())
            .field("subscribed", &self.is_subscribed())
            .finish_non_exhaustive()
    }
}

impl WatchSetManager {
    /// Create a manager seeded with `modules`.
    ///
    /// Duplicates and modules that cannot be located are dropped. If anything
    /// is left and `options.auto_connect` is set, the files are registered
    /// with the watcher and the change subscription is made.
    pub fn new<I, S>(modules: I, options: ManagerOptions, collab: Collaborators) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut manager = Self {
            fs: collab.fs,
            locator: collab.locator,
            watcher: collab.watcher,
            reloader: collab.reloader,
            log: collab.log,
            patterns: options.patterns,
            modules: Vec::new(),
            table: WatchTable::default(),
            hashes: options.use_hash.then(ContentHashes::new),
            events,
            change_tx: Some(change_tx),
            change_rx: Some(change_rx),
        };

        for module in modules {
            let module = module.as_ref().trim();
            if module.is_empty() || manager.position(module).is_some() {
                continue;
            }
            match manager.locator.locate(module) {
                Some(root) => {
                    manager.log_message(&format!("Watching for changes in '{}'", root.display()));
                    manager.modules.push(WatchedModule::new(module, Some(root)));
                }
                None => {
                    manager.log_message(&format!("Could not find path for the module '{module}'"));
                }
            }
        }

        if !manager.modules.is_empty() && options.auto_connect {
            manager.setup_paths(false, true);
        }
        manager
    }

    pub fn state(&self) -> WatchState {
        if self.modules.is_empty() {
            WatchState::Empty
        } else {
            WatchState::Watching
        }
    }

    pub fn modules(&self) -> &[WatchedModule] {
        &self.modules
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn table(&self) -> &WatchTable {
        &self.table
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn is_subscribed(&self) -> bool {
        self.change_tx.is_none()
    }

    /// Files the watcher currently reports as watched.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        self.watcher.files()
    }

    /// Observe reload notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.events.subscribe()
    }

    /// The receiving end of the watcher's change notifications. Can be taken
    /// once, by whoever runs the event loop.
    pub fn take_change_receiver(&mut self) -> Option<ChangeReceiver> {
        self.change_rx.take()
    }

    /// Root of the module that owns `path`, if the path is watched.
    pub fn module_root_for_path(&self, path: &Path) -> Option<&Path> {
        let index = self.table.index_of(&NormalizedPath::new(path))?;
        self.modules.get(index)?.root.as_deref()
    }

    /// Add `module` to the watch list.
    ///
    /// Returns `false` (after logging why) if the reference is empty, already
    /// watched or cannot be located; nothing changes in that case.
    pub fn add(&mut self, module: &str) -> bool {
        let module = module.trim();
        if module.is_empty() {
            self.log_message(&format!("The specified module '{module}' does not exist."));
            return false;
        }
        if self.position(module).is_some() {
            self.log_message(&format!("The module '{module}' is already in the list."));
            return false;
        }
        let Some(root) = self.locator.locate(module) else {
            self.log_message(&format!("Could not find path for the module '{module}'"));
            return false;
        };

        let was_empty = self.state() == WatchState::Empty;
        self.log_message(&format!("Watching for changes in '{}'", root.display()));
        self.modules.push(WatchedModule::new(module, Some(root)));
        self.setup_paths(true, was_empty);
        true
    }

    /// Remove every listed module. Survivors keep their relative order.
    ///
    /// Returns how many modules were removed.
    pub fn remove<S: AsRef<str>>(&mut self, modules: &[S]) -> usize {
        if modules.is_empty() {
            self.log_message("No modules selected.");
            return 0;
        }

        let before = self.modules.len();
        let mut removed = Vec::new();
        self.modules.retain(|m| {
            let hit = modules.iter().any(|r| r.as_ref().trim() == m.name);
            if hit {
                removed.push(m.name.clone());
            }
            !hit
        });

        if removed.is_empty() {
            self.log_message("None of the selected modules are being watched.");
            return 0;
        }
        for name in &removed {
            self.log_message(&format!("Stopped watching '{name}'"));
        }
        self.setup_paths(true, false);
        before - self.modules.len()
    }

    /// Clear every watched path and register the current set again.
    pub fn refresh(&mut self) {
        self.setup_paths(true, false);
    }

    /// Replace the pattern set and refresh.
    pub fn set_patterns(&mut self, patterns: PatternSet) {
        self.patterns = patterns;
        self.refresh();
    }

    /// Update source include/ignore patterns from comma separated text.
    pub fn set_source_patterns_text(&mut self, source: &str, ignore_source: &str) {
        let mut patterns = self.patterns.clone();
        patterns.source = PatternSet::parse_list(source);
        patterns.ignore_source = PatternSet::parse_list(ignore_source);
        self.set_patterns(patterns);
    }

    /// Update stylesheet patterns from comma separated text.
    pub fn set_stylesheet_patterns_text(&mut self, stylesheet: &str) {
        let mut patterns = self.patterns.clone();
        patterns.stylesheet = PatternSet::parse_list(stylesheet);
        self.set_patterns(patterns);
    }

    /// Handle a (debounced) change notification for `path`.
    ///
    /// Never fails: every problem is logged and reported in the outcome, and
    /// the manager stays ready for the next change.
    pub fn on_path_changed(&mut self, path: &Path) -> ChangeOutcome {
        let norm = NormalizedPath::new(path);

        let is_source = norm.has_extension(SOURCE_EXTENSION);
        let is_stylesheet = norm.has_extension(STYLESHEET_EXTENSION);
        if !is_source && !is_stylesheet {
            debug!(path = %norm, "ignoring change to unrelated file");
            return ChangeOutcome::Ignored;
        }

        let Some(index) = self.table.index_of(&norm) else {
            self.log_message(&format!("'{norm}' is not being watched; ignoring change"));
            return ChangeOutcome::NotWatched;
        };

        self.rearm(&norm);

        if let Some(hashes) = self.hashes.as_mut() {
            if !hashes.refresh(self.fs.as_ref(), &norm) {
                self.log_message(&format!("'{}' unchanged; skipping reload", norm.file_name()));
                return ChangeOutcome::Unchanged;
            }
        }

        if is_source {
            self.reload_source(index, &norm)
        } else {
            self.reload_stylesheet(&norm)
        }
    }

    /// Reload every watched source file, regardless of content hashes.
    pub fn reload_all_sources(&mut self) -> Vec<ChangeOutcome> {
        let targets: Vec<(usize, NormalizedPath)> = self
            .table
            .paths()
            .iter()
            .filter(|p| p.has_extension(SOURCE_EXTENSION))
            .filter_map(|p| self.table.index_of(p).map(|i| (i, p.clone())))
            .collect();

        targets
            .into_iter()
            .map(|(index, path)| self.reload_source(index, &path))
            .collect()
    }

    /// Tell observers that stylesheets should be re-applied.
    pub fn reload_all_stylesheets(&mut self) {
        self.log_message("Reloading all stylesheet files...");
        self.emit(ReloadEvent::StylesheetChanged);
    }

    fn reload_source(&mut self, index: usize, path: &NormalizedPath) -> ChangeOutcome {
        let module = match self.module_name_for(index, path) {
            Ok(m) => m,
            Err(err) => {
                warn!(path = %path, error = %err, "no importable name for changed file");
                self.log_message(&format!("failed to reload '{path}' Error={err}..."));
                return ChangeOutcome::Failed(err.to_string());
            }
        };

        match self.reloader.reload(&module) {
            Ok(changed) => {
                info!(module = %module, changed, "module reloaded");
                self.log_message(&format!("'{module}' (changed={changed})"));
                self.emit(ReloadEvent::SourceReloaded {
                    module: module.clone(),
                    changed,
                });
                ChangeOutcome::Reloaded { module, changed }
            }
            Err(source) => {
                let err = HotreloadError::Reload { module, source };
                warn!(path = %path, error = %err, "reload failed");
                self.log_message(&format!("failed to reload '{path}' Error={err}..."));
                ChangeOutcome::Failed(err.to_string())
            }
        }
    }

    fn reload_stylesheet(&mut self, path: &NormalizedPath) -> ChangeOutcome {
        self.emit(ReloadEvent::StylesheetChanged);
        self.log_message(&format!("'{}' changed", path.file_name()));
        ChangeOutcome::StylesheetChanged
    }

    fn module_name_for(
        &self,
        index: usize,
        path: &NormalizedPath,
    ) -> Result<String, HotreloadError> {
        let root = self
            .modules
            .get(index)
            .and_then(|m| m.root.as_deref())
            .ok_or_else(|| HotreloadError::Mapping {
                path: path.to_string(),
                root: format!("<module #{index} has no root>"),
            })?;
        let module = path_to_module(path, &NormalizedPath::new(root))?;
        if !is_valid_module_ref(&module) {
            return Err(HotreloadError::InvalidModuleName(module));
        }
        Ok(module)
    }

    /// Editors that save by replacing the file drop the OS watch on it
    /// while the watcher still lists the path. Drop the watch and register
    /// the current file again so later saves are still seen.
    fn rearm(&mut self, path: &NormalizedPath) {
        let native = path.to_native();
        if !self.fs.is_file(&native) {
            return;
        }
        debug!(path = %path, "re-watching changed file");
        let paths = std::slice::from_ref(&native);
        self.watcher.remove_paths(paths);
        if !self.watcher.add_paths(paths).is_empty() {
            self.log_message(&format!("Could not watch '{path}' again"));
        }
    }

    fn setup_paths(&mut self, clear: bool, connect: bool) {
        if clear {
            self.remove_filenames();
        }
        self.add_filenames();
        if connect {
            self.ensure_subscribed();
        }
    }

    fn ensure_subscribed(&mut self) {
        let Some(tx) = self.change_tx.take() else {
            return;
        };
        self.watcher.subscribe(tx);
        debug!("subscribed to watcher notifications");
    }

    fn remove_filenames(&mut self) {
        let files = self.watcher.files();
        if !files.is_empty() {
            self.watcher.remove_paths(&files);
        }
        let directories = self.watcher.directories();
        if !directories.is_empty() {
            self.watcher.remove_paths(&directories);
        }
        self.log_message(&format!(
            "Removed {} files and {} directories from watcher.",
            files.len(),
            directories.len()
        ));
    }

    fn add_filenames(&mut self) {
        // Roots are looked up again: a package may have been moved or
        // uninstalled since it was added.
        for module in &mut self.modules {
            module.root = self.locator.locate(&module.name);
        }

        let table = {
            let log = &self.log;
            build_watch_table(self.fs.as_ref(), &self.modules, &self.patterns, &|m| {
                log.log(m);
            })
        };

        let native = table.native_paths();
        self.log_message(&format!("Added {} paths to watcher", native.len()));
        if !native.is_empty() {
            for failed in self.watcher.add_paths(&native) {
                self.log_message(&format!("Could not watch '{}'", failed.display()));
            }
        }

        if let Some(hashes) = self.hashes.as_mut() {
            hashes.prime(self.fs.as_ref(), table.paths());
        }
        self.table = table;
    }

    fn position(&self, module: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name == module)
    }

    fn emit(&self, event: ReloadEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn log_message(&self, msg: &str) {
        self.log.log(msg);
    }
}
