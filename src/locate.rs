// src/locate.rs

//! Resolve a dotted module reference to the directory it is loaded from.
//!
//! Resolution is purely structural: the locator looks for the package's
//! `__init__.py` or the module's `.py` file under a list of search roots
//! (in the same order an interpreter would consult them). Nothing is
//! imported or executed.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::watch::patterns::SOURCE_EXTENSION;

/// Environment variable holding extra search roots.
pub const SEARCH_PATH_ENV: &str = "PYTHONPATH";

const PACKAGE_INIT: &str = "__init__";

static MODULE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("module reference regex is valid")
});

/// True if `module` looks like a dotted module reference (`pkg.sub`).
pub fn is_valid_module_ref(module: &str) -> bool {
    MODULE_REF.is_match(module)
}

/// Finds the on-disk root of a module.
///
/// `None` is the normal answer for a typo or an uninstalled package; it is
/// not an error.
pub trait ModuleLocator: Send + Sync + Debug {
    fn locate(&self, module: &str) -> Option<PathBuf>;
}

/// Locator that walks an ordered list of search roots.
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    fs: Arc<dyn FileSystem>,
    roots: Vec<PathBuf>,
}

impl SearchPathLocator {
    pub fn new(fs: Arc<dyn FileSystem>, roots: Vec<PathBuf>) -> Self {
        Self { fs, roots }
    }

    /// Use `roots` followed by every entry of `PYTHONPATH`.
    pub fn with_env(fs: Arc<dyn FileSystem>, mut roots: Vec<PathBuf>) -> Self {
        if let Some(value) = std::env::var_os(SEARCH_PATH_ENV) {
            roots.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        Self::new(fs, roots)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn locate_in(&self, search_root: &Path, segments: &[&str]) -> Option<PathBuf> {
        let (last, parents) = segments.split_last()?;

        let mut dir = search_root.to_path_buf();
        for seg in parents {
            dir.push(seg);
            if !self.fs.is_dir(&dir) {
                return None;
            }
        }

        // Package: origin is `<dir>/<last>/__init__.py`, root is its parent.
        let package_dir = dir.join(last);
        let init = package_dir.join(format!("{PACKAGE_INIT}.{SOURCE_EXTENSION}"));
        if self.fs.is_file(&init) {
            return Some(package_dir);
        }

        // Plain module: origin is `<dir>/<last>.py`, root is `<dir>`.
        let module_file = dir.join(format!("{last}.{SOURCE_EXTENSION}"));
        if self.fs.is_file(&module_file) {
            return Some(dir);
        }

        None
    }
}

impl ModuleLocator for SearchPathLocator {
    fn locate(&self, module: &str) -> Option<PathBuf> {
        if !is_valid_module_ref(module) {
            debug!(module, "not a valid module reference");
            return None;
        }
        let segments: Vec<&str> = module.split('.').collect();

        for root in &self.roots {
            trace!(module, root = ?root, "searching");
            if let Some(found) = self.locate_in(root, &segments) {
                let found = self.fs.canonicalize(&found).unwrap_or(found);
                debug!(module, root = ?found, "module located");
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn locator(fs: &MockFileSystem, roots: &[&str]) -> SearchPathLocator {
        SearchPathLocator::new(
            Arc::new(fs.clone()),
            roots.iter().map(PathBuf::from).collect(),
        )
    }

    #[test]
    fn package_resolves_to_its_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/pkg/__init__.py", "");
        fs.add_file("/site/pkg/sub/__init__.py", "");

        let loc = locator(&fs, &["/site"]);
        assert_eq!(loc.locate("pkg"), Some(PathBuf::from("/site/pkg")));
        assert_eq!(loc.locate("pkg.sub"), Some(PathBuf::from("/site/pkg/sub")));
    }

    #[test]
    fn plain_module_resolves_to_parent_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/pkg/__init__.py", "");
        fs.add_file("/site/pkg/util.py", "");

        let loc = locator(&fs, &["/site"]);
        assert_eq!(loc.locate("pkg.util"), Some(PathBuf::from("/site/pkg")));
    }

    #[test]
    fn first_search_root_wins() {
        let fs = MockFileSystem::new();
        fs.add_file("/a/pkg/__init__.py", "");
        fs.add_file("/b/pkg/__init__.py", "");

        let loc = locator(&fs, &["/b", "/a"]);
        assert_eq!(loc.locate("pkg"), Some(PathBuf::from("/b/pkg")));
    }

    #[test]
    fn missing_and_malformed_references_are_not_found() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/pkg/__init__.py", "");

        let loc = locator(&fs, &["/site"]);
        assert_eq!(loc.locate("nope"), None);
        assert_eq!(loc.locate("pkg.missing"), None);
        assert_eq!(loc.locate(""), None);
        assert_eq!(loc.locate("pkg..sub"), None);
        assert_eq!(loc.locate("1pkg"), None);
    }

    #[test]
    fn directory_without_init_is_not_a_package() {
        let fs = MockFileSystem::new();
        fs.add_dir("/site/data");

        let loc = locator(&fs, &["/site"]);
        assert_eq!(loc.locate("data"), None);
    }

    #[test]
    fn module_reference_validation() {
        assert!(is_valid_module_ref("pkg"));
        assert!(is_valid_module_ref("_pkg.sub_2"));
        assert!(!is_valid_module_ref("pkg."));
        assert!(!is_valid_module_ref("pkg-name"));
        assert!(!is_valid_module_ref(" pkg"));
    }
}
