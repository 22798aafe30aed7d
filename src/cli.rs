// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hotreload`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hotreload",
    version,
    about = "Watch module sources and stylesheets and reload them on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Missing file is fine when it is the
    /// default path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Module to watch (repeatable). Added to the modules from the config
    /// file and from `HOTRELOAD_HOT_RELOAD_MODULES`.
    #[arg(short = 'm', long = "module", value_name = "MODULE")]
    pub modules: Vec<String>,

    /// Directory to search for modules (repeatable). Searched before the
    /// config's `search_paths` and `PYTHONPATH`.
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// Reload command template; `{module}` is replaced by the module name.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: Option<String>,

    /// Quiescence window in milliseconds.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Skip reloads when the file content is unchanged.
    #[arg(long)]
    pub use_hash: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HOTRELOAD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve modules and print the watch table, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_flags_accumulate() {
        let args = CliArgs::parse_from([
            "hotreload", "-m", "pkg_a", "--module", "pkg_b", "--search-path", "src",
            "--debounce-ms", "250", "--dry-run",
        ]);
        assert_eq!(args.modules, vec!["pkg_a", "pkg_b"]);
        assert_eq!(args.search_paths, vec![PathBuf::from("src")]);
        assert_eq!(args.debounce_ms, Some(250));
        assert!(args.dry_run);
        assert!(args.config.is_none());
    }
}
