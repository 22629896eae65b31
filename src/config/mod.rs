// src/config/mod.rs

//! Configuration loading and validation for cmdgate.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate route invariants (`validate.rs`).
//! - Normalize loosely-typed command arguments (`args.rs`).

pub mod args;
pub mod loader;
pub mod model;
pub mod validate;

pub use args::normalize_args;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ArgValue, CommandConfig, ConfigFile, LoggingSection, RawConfigFile, RouteConfig,
    ServerSection,
};
