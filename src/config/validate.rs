// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HotreloadError, Result};
use crate::locate::is_valid_module_ref;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = HotreloadError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_debounce(cfg)?;
    validate_modules(cfg)?;
    validate_patterns(cfg)?;
    validate_reload(cfg)?;
    Ok(())
}

fn validate_debounce(cfg: &RawConfigFile) -> Result<()> {
    if cfg.debounce_ms == 0 {
        return Err(HotreloadError::ConfigError(
            "debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_modules(cfg: &RawConfigFile) -> Result<()> {
    for module in &cfg.modules {
        if !is_valid_module_ref(module) {
            return Err(HotreloadError::ConfigError(format!(
                "'{module}' is not a valid module reference (expected e.g. \"pkg.sub\")"
            )));
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let lists = [
        ("source", &cfg.patterns.source),
        ("ignore_source", &cfg.patterns.ignore_source),
        ("stylesheet", &cfg.patterns.stylesheet),
    ];
    for (name, list) in lists {
        if list.iter().any(|p| p.trim().is_empty()) {
            return Err(HotreloadError::ConfigError(format!(
                "[patterns].{name} must not contain blank patterns"
            )));
        }
    }
    Ok(())
}

fn validate_reload(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = &cfg.reload.command {
        if cmd.trim().is_empty() {
            return Err(HotreloadError::ConfigError(
                "[reload].command must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
