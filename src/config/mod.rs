// src/config/mod.rs

//! Configuration for hotreload.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Read the environment switches that activate hot reload (`activation.rs`).

pub mod activation;
pub mod loader;
pub mod model;
pub mod validate;

pub use activation::ActivationConfig;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, ReloadSection};
