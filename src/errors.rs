// src/errors.rs

//! Crate-wide error type and aliases.
//!
//! Everything here is raised *before* a run starts. Task failures during a
//! run are not errors; they are recorded in the run report.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskName),

    #[error("Task '{task}' depends on unknown task '{missing}'")]
    DanglingReference { task: TaskName, missing: TaskName },

    #[error("Cycle detected in DAG: {}", .cycle.join(" -> "))]
    CycleDetected { cycle: Vec<TaskName> },

    #[error("Task '{task}' references unresolved variable '{variable}'")]
    UnresolvedVariable { task: TaskName, variable: String },

    #[error("Required variable '{0}' is not set")]
    MissingVariable(String),

    #[error("Task '{task}' references unknown callable '{function}'")]
    UnknownCallable { task: TaskName, function: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
