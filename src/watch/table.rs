// src/watch/table.rs

//! The watch table: every watched file, and the index of the module that
//! owns it.
//!
//! The table is always rebuilt from scratch. Removing a module shifts the
//! indices of the modules after it, so patching entries in place would leave
//! stale indices behind.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::path_utils::NormalizedPath;
use crate::watch::patterns::{match_files, PatternSet};

/// A module in the watched list. `root` is `None` when the module could not
/// be located at the last rebuild; it keeps its index regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedModule {
    pub name: String,
    pub root: Option<PathBuf>,
}

impl WatchedModule {
    pub fn new(name: impl Into<String>, root: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchTable {
    paths: Vec<NormalizedPath>,
    index: HashMap<NormalizedPath, usize>,
}

impl WatchTable {
    /// Every watched path, in module order (sources before stylesheets).
    pub fn paths(&self) -> &[NormalizedPath] {
        &self.paths
    }

    /// Watched paths converted for the host file watcher.
    pub fn native_paths(&self) -> Vec<PathBuf> {
        self.paths.iter().map(NormalizedPath::to_native).collect()
    }

    /// Index of the owning module.
    pub fn index_of(&self, path: &NormalizedPath) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn insert(&mut self, path: NormalizedPath, module_index: usize) {
        if self.index.contains_key(&path) {
            // Nested module roots: the earlier module keeps the file.
            debug!(path = %path, module_index, "path already owned by another module");
            return;
        }
        self.index.insert(path.clone(), module_index);
        self.paths.push(path);
    }
}

/// Build the watch table for `modules`, in order.
///
/// Modules without a root contribute nothing. A module whose directory
/// cannot be scanned is logged and also contributes nothing. Given the same
/// inputs and an unchanged filesystem the result is identical.
pub fn build_watch_table(
    fs: &dyn FileSystem,
    modules: &[WatchedModule],
    patterns: &PatternSet,
    log: &dyn Fn(&str),
) -> WatchTable {
    let mut table = WatchTable::default();

    for (i, module) in modules.iter().enumerate() {
        let Some(root) = &module.root else {
            debug!(module = %module.name, "module has no root; skipping");
            continue;
        };

        let sources = match_files(fs, root, &patterns.source, &patterns.ignore_source, log);
        let stylesheets = match_files(fs, root, &patterns.stylesheet, &[], log);

        let (sources, stylesheets) = match (sources, stylesheets) {
            (Ok(s), Ok(q)) => (s, q),
            (Err(err), _) | (_, Err(err)) => {
                warn!(module = %module.name, root = ?root, error = %err, "scan failed");
                log(&format!("Could not scan '{}': {err}", root.display()));
                continue;
            }
        };

        log(&format!(
            "Found {} source files and {} stylesheet files '{}'",
            sources.len(),
            stylesheets.len(),
            module.name
        ));

        for path in sources.into_iter().chain(stylesheets) {
            table.insert(path, i);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fixture() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/site/alpha/__init__.py", "");
        fs.add_file("/site/alpha/a.py", "");
        fs.add_file("/site/alpha/style.qss", "");
        fs.add_file("/site/beta/__init__.py", "");
        fs.add_file("/site/beta/b.py", "");
        fs
    }

    #[test]
    fn indices_follow_module_order() {
        let fs = fixture();
        let modules = vec![
            WatchedModule::new("alpha", Some("/site/alpha".into())),
            WatchedModule::new("beta", Some("/site/beta".into())),
        ];
        let table = build_watch_table(&fs, &modules, &PatternSet::default(), &|_| {});

        let paths: Vec<_> = table.paths().iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/site/alpha/a.py", "/site/alpha/style.qss", "/site/beta/b.py"]
        );
        assert_eq!(table.index_of(&"/site/alpha/style.qss".into()), Some(0));
        assert_eq!(table.index_of(&"/site/beta/b.py".into()), Some(1));
    }

    #[test]
    fn unresolved_module_keeps_its_index_but_has_no_paths() {
        let fs = fixture();
        let modules = vec![
            WatchedModule::new("gone", None),
            WatchedModule::new("beta", Some("/site/beta".into())),
        ];
        let table = build_watch_table(&fs, &modules, &PatternSet::default(), &|_| {});

        assert_eq!(table.len(), 1);
        assert_eq!(table.index_of(&"/site/beta/b.py".into()), Some(1));
        assert!(table.paths().iter().all(|p| table.index_of(p) == Some(1)));
    }

    #[test]
    fn nested_roots_do_not_duplicate_paths() {
        let fs = fixture();
        fs.add_file("/site/alpha/inner/__init__.py", "");
        fs.add_file("/site/alpha/inner/c.py", "");
        let modules = vec![
            WatchedModule::new("alpha", Some("/site/alpha".into())),
            WatchedModule::new("alpha.inner", Some("/site/alpha/inner".into())),
        ];
        let table = build_watch_table(&fs, &modules, &PatternSet::default(), &|_| {});

        assert_eq!(table.len(), 3);
        assert_eq!(table.index_of(&"/site/alpha/inner/c.py".into()), Some(0));
    }

    #[test]
    fn logs_counts_per_module() {
        let fs = fixture();
        let messages = std::cell::RefCell::new(Vec::new());
        let modules = vec![WatchedModule::new("alpha", Some("/site/alpha".into()))];
        build_watch_table(&fs, &modules, &PatternSet::default(), &|m| {
            messages.borrow_mut().push(m.to_string())
        });
        assert_eq!(
            messages.into_inner(),
            vec!["Found 1 source files and 1 stylesheet files 'alpha'".to_string()]
        );
    }

    #[test]
    fn missing_root_directory_is_logged_and_skipped() {
        let fs = fixture();
        let messages = std::cell::RefCell::new(Vec::new());
        let modules = vec![
            WatchedModule::new("ghost", Some("/site/ghost".into())),
            WatchedModule::new("beta", Some("/site/beta".into())),
        ];
        let table = build_watch_table(&fs, &modules, &PatternSet::default(), &|m| {
            messages.borrow_mut().push(m.to_string())
        });
        assert_eq!(table.len(), 1);
        assert!(messages.into_inner()[0].starts_with("Could not scan"));
    }
}
