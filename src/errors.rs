// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Note that "module not found" is deliberately absent: locating a module
//! returns `Option` and callers branch on it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotreloadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Pattern '{pattern}' is not valid: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The file is not located under the parent of the module root. This
    /// means the watch table and the filesystem have diverged.
    #[error("path '{path}' is not located under module root '{root}'")]
    Mapping { path: String, root: String },

    /// A watched file maps to a name that cannot be imported (`my-mod.py`,
    /// or a file name carrying shell metacharacters).
    #[error("'{0}' is not a valid module name")]
    InvalidModuleName(String),

    #[error("failed to reload '{module}': {source}")]
    Reload {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HotreloadError>;
