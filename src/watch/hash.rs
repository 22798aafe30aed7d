// src/watch/hash.rs

//! Content hashing used to skip reloads when a notification arrives but the
//! file bytes did not change (editors that touch a file on focus loss, for
//! instance).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::path_utils::NormalizedPath;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// In-memory record of the last seen hash of each watched file.
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: HashMap<NormalizedPath, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored hashes with fresh ones for `paths`.
    ///
    /// Files that cannot be read are left out and will count as changed on
    /// their first notification.
    pub fn prime(&mut self, fs: &dyn FileSystem, paths: &[NormalizedPath]) {
        self.hashes.clear();
        for path in paths {
            match compute_file_hash(fs, &path.to_native()) {
                Ok(hash) => {
                    self.hashes.insert(path.clone(), hash);
                }
                Err(err) => debug!(path = %path, error = %err, "could not hash file"),
            }
        }
    }

    /// Re-hash `path` and report whether it differs from the stored hash.
    ///
    /// Unreadable files are reported as changed so the reload still runs
    /// and surfaces the real error.
    pub fn refresh(&mut self, fs: &dyn FileSystem, path: &NormalizedPath) -> bool {
        let new_hash = match compute_file_hash(fs, &path.to_native()) {
            Ok(h) => h,
            Err(err) => {
                debug!(path = %path, error = %err, "hashing failed; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };
        match self.hashes.insert(path.clone(), new_hash.clone()) {
            Some(old) => old != new_hash,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
