// src/watch/patterns.rs

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::errors::HotreloadError;
use crate::fs::FileSystem;
use crate::watch::path_utils::NormalizedPath;

/// Extension of source files (reloaded as modules).
pub const SOURCE_EXTENSION: &str = "py";
/// Extension of stylesheet files (trigger a theme refresh).
pub const STYLESHEET_EXTENSION: &str = "qss";

pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &["**/*.py"];
pub const DEFAULT_IGNORE_SOURCE_PATTERNS: &[&str] = &["**/__init__.py", "**/test_*.py"];
pub const DEFAULT_STYLESHEET_PATTERNS: &[&str] = &["**/*.qss"];

/// The three pattern lists applied to every watched module.
///
/// Corresponds to the `[patterns]` config section:
///
/// ```toml
/// [patterns]
/// source = ["**/*.py"]
/// ignore_source = ["**/__init__.py", "**/test_*.py"]
/// stylesheet = ["**/*.qss"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternSet {
    pub source: Vec<String>,
    pub ignore_source: Vec<String>,
    pub stylesheet: Vec<String>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            source: to_owned(DEFAULT_SOURCE_PATTERNS),
            ignore_source: to_owned(DEFAULT_IGNORE_SOURCE_PATTERNS),
            stylesheet: to_owned(DEFAULT_STYLESHEET_PATTERNS),
        }
    }
}

impl PatternSet {
    /// Split comma separated pattern text, trimming whitespace and dropping
    /// empty entries: `"**/*.py, **/*.pyw"` -> `["**/*.py", "**/*.pyw"]`.
    pub fn parse_list(text: &str) -> Vec<String> {
        text.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn to_owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

/// Compile a single pattern.
///
/// `*` never crosses a `/` while `**` matches any number of directories.
/// Patterns must be relative to the module root.
pub fn compile_pattern(pattern: &str) -> Result<globset::Glob, HotreloadError> {
    let invalid = |reason: &str| HotreloadError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if pattern.trim().is_empty() {
        return Err(invalid("empty pattern"));
    }
    if pattern.starts_with('/') || pattern.starts_with('\\') {
        return Err(invalid("non-relative patterns are unsupported"));
    }

    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| invalid(&e.kind().to_string()))
}

/// Build a `GlobSet` out of the valid patterns.
///
/// Invalid patterns are skipped and reported through `log`; they never abort
/// the whole set. Returns `None` when no pattern survived.
pub fn build_globset(patterns: &[String], log: &dyn Fn(&str)) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0usize;
    let mut seen = HashSet::new();

    for pat in patterns {
        if !seen.insert(pat.as_str()) {
            continue;
        }
        match compile_pattern(pat) {
            Ok(glob) => {
                builder.add(glob);
                added += 1;
            }
            Err(err) => {
                debug!(pattern = %pat, error = %err, "skipping invalid glob pattern");
                log(&format!("Pattern '{pat}' is not valid."));
            }
        }
    }

    if added == 0 {
        return None;
    }
    // Every glob was already compiled on its own, so building the set only
    // fails on internal size limits; treat that like "no patterns".
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            log(&format!("Failed to combine patterns: {err}"));
            None
        }
    }
}

/// Enumerate files under `root` that match any `include` pattern and no
/// `exclude` pattern.
///
/// Matching is done against the forward-slash path relative to `root`. The
/// result is sorted and free of duplicates.
pub fn match_files(
    fs: &dyn FileSystem,
    root: &Path,
    include: &[String],
    exclude: &[String],
    log: &dyn Fn(&str),
) -> Result<Vec<NormalizedPath>> {
    let Some(include_set) = build_globset(include, log) else {
        return Ok(Vec::new());
    };
    let exclude_set = build_globset(exclude, log);

    let mut matched = BTreeSet::new();
    for (abs, rel) in walk_files(fs, root)? {
        if !include_set.is_match(&rel) {
            continue;
        }
        if exclude_set.as_ref().is_some_and(|ex| ex.is_match(&rel)) {
            continue;
        }
        matched.insert(NormalizedPath::new(&abs));
    }

    Ok(matched.into_iter().collect())
}

/// Recursively list files below `root` as `(absolute, relative)` pairs.
///
/// Directories reached twice (through symlinks) are only walked once. Only
/// a failure to read `root` itself is an error; unreadable subdirectories
/// are skipped.
fn walk_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<(std::path::PathBuf, String)>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let key = fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(key) {
            continue;
        }
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if dir.as_path() != root => {
                debug!(dir = ?dir, error = %err, "skipping unreadable directory");
                continue;
            }
            Err(err) => return Err(err),
        };
        for path in entries {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel = NormalizedPath::new(rel).as_str().to_string();
                    files.push((path, rel));
                }
            }
        }
    }

    Ok(files)
}
