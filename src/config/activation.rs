// src/config/activation.rs

//! Environment switches that turn hot reload on.
//!
//! - `HOTRELOAD_HOT_RELOAD=1` enables it (any other value, or none, leaves it
//!   off).
//! - `HOTRELOAD_HOT_RELOAD_MODULES=pkg_a,pkg_b` lists the modules to watch.

pub const ENABLE_ENV: &str = "HOTRELOAD_HOT_RELOAD";
pub const MODULES_ENV: &str = "HOTRELOAD_HOT_RELOAD_MODULES";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationConfig {
    pub enabled: bool,
    pub modules: Vec<String>,
}

impl ActivationConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from `(name, value)` pairs; the last occurrence of a name wins.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut enabled = false;
        let mut modules = Vec::new();
        for (k, v) in vars {
            match k.as_ref() {
                ENABLE_ENV => enabled = v.as_ref() == "1",
                MODULES_ENV => modules = parse_module_list(v.as_ref()),
                _ => {}
            }
        }
        Self { enabled, modules }
    }
}

/// Split a comma separated module list. Entries are trimmed, empty ones
/// dropped and duplicates removed (first occurrence wins).
pub fn parse_module_list(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in text.split(',').map(str::trim) {
        if !entry.is_empty() && !out.iter().any(|m| m == entry) {
            out.push(entry.to_string());
        }
    }
    out
}
