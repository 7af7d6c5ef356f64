// src/report.rs

//! Final run report: every task's terminal status plus failure details.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::dag::TaskRunState;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::types::PipelineStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub id: TaskName,
    pub status: TaskRunState,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Failure detail of the last failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub run_id: u64,
    pub status: PipelineStatus,
    pub duration_ms: u64,
    /// In topological order.
    pub tasks: Vec<TaskReport>,
    pub failed: Vec<TaskName>,
    pub skipped: Vec<TaskName>,
}

impl RunReport {
    pub fn with_pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline = name.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Succeeded
    }

    pub fn task(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn status_of(&self, id: &str) -> Option<TaskRunState> {
        self.task(id).map(|t| t.status)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Other(anyhow::Error::from(e)))
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pipeline '{}' run {} {} in {}ms",
            self.pipeline, self.run_id, self.status, self.duration_ms
        )?;

        let width = self.tasks.iter().map(|t| t.id.len()).max().unwrap_or(0);
        for task in &self.tasks {
            write!(f, "  {:<width$}  {:<10}", task.id, task.status.to_string())?;
            if task.attempts > 1 {
                write!(f, "  attempts={}", task.attempts)?;
            }
            if let Some(ms) = task.duration_ms {
                write!(f, "  {ms}ms")?;
            }
            writeln!(f)?;
            if let Some(ref detail) = task.detail {
                for line in detail.lines() {
                    writeln!(f, "      {line}")?;
                }
            }
        }

        if !self.failed.is_empty() {
            writeln!(f, "failed: {}", self.failed.join(", "))?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "skipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}
