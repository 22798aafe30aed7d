// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a config file, validate it and resolve relative search paths
/// against the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut config = ConfigFile::try_from(raw)?;

    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    for sp in &mut config.search_paths {
        if sp.is_relative() {
            *sp = base.join(&*sp);
        }
    }

    Ok(config)
}

/// `Hotreload.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Hotreload.toml")
}
