#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Builder for an on-disk package tree under a temporary search root.
pub struct PackageTreeBuilder {
    dir: TempDir,
}

impl PackageTreeBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Create `rel` (slash separated, relative to the search root) with
    /// `content`, creating parent directories as needed.
    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&path, content).expect("Failed to write file");
        self
    }

    /// Create a package directory `name` (dotted) with `__init__.py` at
    /// every level.
    pub fn package(mut self, name: &str) -> Self {
        let mut rel = PathBuf::new();
        for seg in name.split('.') {
            rel.push(seg);
            let init = rel.join("__init__.py");
            self = self.file(&init.to_string_lossy(), "");
        }
        self
    }

    pub fn build(self) -> PackageTree {
        PackageTree { dir: self.dir }
    }
}

impl Default for PackageTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A built package tree. Deleted when dropped.
pub struct PackageTree {
    dir: TempDir,
}

impl PackageTree {
    /// The search root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Canonical path of `rel` under the search root.
    pub fn path(&self, rel: &str) -> PathBuf {
        let joined = self.dir.path().join(rel);
        fs::canonicalize(&joined).unwrap_or(joined)
    }

    pub fn write(&self, rel: &str, content: &str) {
        fs::write(self.dir.path().join(rel), content).expect("Failed to write file");
    }
}
