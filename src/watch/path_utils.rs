// src/watch/path_utils.rs

//! Path normalisation for the watch table.
//!
//! All paths produced by directory matching are stored with forward slashes.
//! They are only converted back to a host `PathBuf` when handed to the file
//! watcher, so the rest of the crate never branches on the platform
//! separator.

use std::fmt;
use std::path::{Path, PathBuf};

/// A file path with `/` as its only separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalise a host path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::from_str_lossy(&path.as_ref().to_string_lossy())
    }

    /// Normalise a path given as text. A trailing separator is dropped
    /// (except for a bare root).
    ///
    /// Backslashes become forward slashes on Windows hosts and for
    /// Windows-shaped input (`C:\\...`, `\\\\server\\...`). Elsewhere a
    /// backslash is an ordinary file name character and is kept.
    pub fn from_str_lossy(s: &str) -> Self {
        let mut s = if cfg!(windows) || is_windows_shaped(s) {
            s.replace('\\', "/")
        } else {
            s.to_string()
        };
        while s.len() > 1 && s.ends_with('/') {
            s.pop();
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last separator, or `None` for a single segment.
    pub fn parent(&self) -> Option<NormalizedPath> {
        let (head, _) = self.0.rsplit_once('/')?;
        if head.is_empty() {
            // "/pkg" -> "/"
            return Some(Self("/".to_string()));
        }
        Some(Self(head.to_string()))
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// True if the file name ends with `.{ext}` (`ext` without the dot).
    pub fn has_extension(&self, ext: &str) -> bool {
        self.file_name()
            .rsplit_once('.')
            .is_some_and(|(stem, e)| !stem.is_empty() && e == ext)
    }

    /// The remainder of this path after `base`, without a leading separator.
    ///
    /// Matching is segment-aware: `/a/bc` is not under `/a/b`.
    pub fn strip_base(&self, base: &NormalizedPath) -> Option<&str> {
        let base = base.as_str();
        if base == "/" {
            return self.0.strip_prefix('/');
        }
        let rest = self.0.strip_prefix(base)?;
        rest.strip_prefix('/')
    }

    /// Convert to a host path for handing to the file watcher.
    pub fn to_native(&self) -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(self.0.replace('/', "\\"))
        } else {
            PathBuf::from(&self.0)
        }
    }
}

/// Drive-letter or UNC prefix.
fn is_windows_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    s.starts_with("\\\\") || (b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':')
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::from_str_lossy(s)
    }
}
