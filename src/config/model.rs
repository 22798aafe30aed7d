// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::watch::debounce::DEFAULT_DEBOUNCE;
use crate::watch::patterns::PatternSet;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// modules = ["pkg_a", "pkg_b.sub"]
/// search_paths = ["src", "."]
/// debounce_ms = 500
/// use_hash = false
///
/// [patterns]
/// source = ["**/*.py"]
/// ignore_source = ["**/__init__.py", "**/test_*.py"]
/// stylesheet = ["**/*.qss"]
///
/// [reload]
/// command = "python -m devtools.reload {module}"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Modules to watch at startup.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Directories searched (in order) when locating modules. Relative
    /// entries are resolved against the config file's directory.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Quiescence window before a changed file is handled.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Skip reloads when the file content did not change.
    #[serde(default)]
    pub use_hash: bool,

    #[serde(default)]
    pub patterns: PatternSet,

    #[serde(default)]
    pub reload: ReloadSection,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            search_paths: Vec::new(),
            debounce_ms: default_debounce_ms(),
            use_hash: false,
            patterns: PatternSet::default(),
            reload: ReloadSection::default(),
        }
    }
}

/// `[reload]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadSection {
    /// Shell command run for every module reload; `{module}` is replaced
    /// with the dotted module name. Without it reloads are only logged.
    #[serde(default)]
    pub command: Option<String>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub modules: Vec<String>,
    pub search_paths: Vec<PathBuf>,
    pub debounce: Duration,
    pub use_hash: bool,
    pub patterns: PatternSet,
    pub reload: ReloadSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            modules: raw.modules,
            search_paths: raw.search_paths,
            debounce: Duration::from_millis(raw.debounce_ms),
            use_hash: raw.use_hash,
            patterns: raw.patterns,
            reload: raw.reload,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}
