// src/watch/mod.rs

//! File discovery, path mapping and change detection.
//!
//! This module is responsible for:
//! - Matching include/exclude glob patterns under a module root.
//! - Building the watch table (file path -> owning module index).
//! - Turning a changed file path back into a dotted module name.
//! - The file-watch collaborator and notification debouncing.
//! - (Optionally) content hashing to skip reloads of unchanged files.
//!
//! It knows nothing about reloading; that is the manager's job.

pub mod debounce;
pub mod hash;
pub mod module_name;
pub mod path_utils;
pub mod patterns;
pub mod table;
pub mod watcher;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use module_name::path_to_module;
pub use path_utils::NormalizedPath;
pub use patterns::{match_files, PatternSet};
pub use table::{build_watch_table, WatchTable, WatchedModule};
pub use watcher::{ChangeReceiver, ChangeSender, FileWatcher, NotifyWatcher};
