// src/config/mod.rs

//! Pipeline description loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk and assemble its variables (`loader.rs`).
//! - Validate file-level invariants such as one action per task (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str, resolve_variables};
pub use model::{ConfigFile, DefaultSection, PipelineSection, RawConfigFile, TaskConfig};
pub use validate::validate_config;
