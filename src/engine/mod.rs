// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the runtime event loop that reacts to task completion events coming
//!   back from the executor
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. The scheduler is only ever touched from the
//! runtime loop, so completion events arriving concurrently are serialised
//! through its channel.

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task attempt, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed { detail: String },
}

impl TaskOutcome {
    pub fn failed(detail: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Output captured while a task attempt ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Events flowing into the runtime from the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task attempt finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        attempt: u32,
        outcome: TaskOutcome,
        output: TaskOutput,
    },
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
