// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod locate;
pub mod logging;
pub mod reload;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, ActivationConfig, ConfigFile};
use crate::engine::{run_event_loop, Collaborators, ManagerOptions, WatchSetManager, WatchState};
use crate::fs::{FileSystem, RealFileSystem};
use crate::locate::{ModuleLocator, SearchPathLocator};
use crate::logging::LogSink;
use crate::reload::{CommandReloader, LoggingReloader, Reloader};
use crate::watch::table::{build_watch_table, WatchedModule};
use crate::watch::watcher::NotifyWatcher;

/// Install hot reload if the environment asks for it.
///
/// Returns `Ok(None)` when `activation.enabled` is false; `make` is not
/// called in that case, so no watcher is created. Otherwise the manager is
/// seeded with `activation.modules`. The caller owns the returned manager;
/// dropping it stops watching.
pub fn install_hot_reload<F>(
    activation: &ActivationConfig,
    options: ManagerOptions,
    make: F,
) -> Result<Option<WatchSetManager>>
where
    F: FnOnce() -> Result<Collaborators>,
{
    if !activation.enabled {
        debug!("hot reload not enabled");
        return Ok(None);
    }
    let collab = make()?;
    Ok(Some(WatchSetManager::new(&activation.modules, options, collab)))
}

/// Production collaborators: real filesystem, search-path locator (with
/// `PYTHONPATH` appended), `notify` watcher and, if `command` is given, a
/// command based reloader.
pub fn default_collaborators(
    search_roots: Vec<PathBuf>,
    command: Option<String>,
    log: LogSink,
) -> Result<Collaborators> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let reloader: Box<dyn Reloader> = match command {
        Some(cmd) => Box::new(CommandReloader::new(cmd)),
        None => Box::new(LoggingReloader),
    };
    Ok(Collaborators {
        locator: Box::new(SearchPathLocator::with_env(Arc::clone(&fs), search_roots)),
        fs,
        watcher: Box::new(NotifyWatcher::new()?),
        reloader,
        log,
    })
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, environment, CLI overrides)
/// - the watch-set manager and its collaborators
/// - the debounced event loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let activation = ActivationConfig::from_env();

    let mut modules = cfg.modules.clone();
    modules.extend(activation.modules.iter().cloned());
    modules.extend(args.modules.iter().cloned());

    let mut search_roots = args.search_paths.clone();
    search_roots.extend(cfg.search_paths.iter().cloned());
    if search_roots.is_empty() {
        search_roots.push(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    }

    let window = args
        .debounce_ms
        .map(|ms| std::time::Duration::from_millis(ms.max(1)))
        .unwrap_or(cfg.debounce);

    if args.dry_run {
        print_dry_run(&cfg, &modules, search_roots);
        return Ok(());
    }

    let command = args.command.clone().or_else(|| cfg.reload.command.clone());
    let log = LogSink::with_callback(|line| println!("{line}"));
    let collab = default_collaborators(search_roots, command, log)?;

    let options = ManagerOptions {
        patterns: cfg.patterns.clone(),
        use_hash: args.use_hash || cfg.use_hash,
        auto_connect: true,
    };
    let mut manager = WatchSetManager::new(&modules, options, collab);
    if manager.state() == WatchState::Empty {
        bail!("none of the requested modules could be located; nothing to watch");
    }

    let changes = manager
        .take_change_receiver()
        .context("change receiver already taken")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    info!(modules = ?manager.module_names(), "watching");
    run_event_loop(&mut manager, changes, window, shutdown).await;
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
                    .with_context(|| format!("loading config {}", path.display()))
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Print the resolved modules and the watch table without watching.
fn print_dry_run(cfg: &ConfigFile, modules: &[String], search_roots: Vec<PathBuf>) {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let locator = SearchPathLocator::with_env(Arc::clone(&fs), search_roots);

    println!("hotreload dry-run");
    println!("  search paths:");
    for root in locator.roots() {
        println!("    - {}", root.display());
    }
    println!("  source patterns: {:?}", cfg.patterns.source);
    println!("  ignore patterns: {:?}", cfg.patterns.ignore_source);
    println!("  stylesheet patterns: {:?}", cfg.patterns.stylesheet);
    println!();

    let mut watched: Vec<WatchedModule> = Vec::new();
    for name in modules {
        if watched.iter().any(|m| &m.name == name) {
            continue;
        }
        let root = locator.locate(name);
        match &root {
            Some(r) => println!("module {name}: {}", r.display()),
            None => println!("module {name}: not found"),
        }
        watched.push(WatchedModule::new(name.as_str(), root));
    }

    let table = build_watch_table(fs.as_ref(), &watched, &cfg.patterns, &|m| println!("  {m}"));
    println!();
    println!("watch table ({} paths):", table.len());
    for path in table.paths() {
        if let Some(i) = table.index_of(path) {
            println!("  [{i}] {path}");
        }
    }

    debug!("dry-run complete (nothing watched)");
}
