// src/config/validate.rs

//! Checks that belong to the file format itself.
//!
//! Graph-level checks (unknown dependencies, cycles, unresolved variables)
//! happen in [`GraphBuilder::build`](crate::dag::GraphBuilder::build), which
//! every pipeline goes through regardless of where it was defined.

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_pipeline_section(cfg)?;
    validate_task_actions(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipelineError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.name.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[pipeline].name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_actions(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        match (&task.cmd, &task.callable) {
            (Some(_), Some(_)) => {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' sets both `cmd` and `callable`"
                )));
            }
            (None, None) => {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' needs either `cmd` or `callable`"
                )));
            }
            (Some(_), None) if !task.kwargs.is_empty() => {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' sets `kwargs` without `callable`"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
