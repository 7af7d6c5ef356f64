// src/dag/task_info.rs

//! Per-run task state.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dag::task::{Task, TaskAction};
use crate::engine::TaskName;
use crate::types::JoinPolicy;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on predecessors.
    Pending,
    /// Dispatched to the executor.
    Running,
    Succeeded,
    /// Failed with no retries left.
    Failed,
    /// Never ran because its join policy can no longer be met.
    Skipped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Skipped
        )
    }
}

/// Public, read-only view of a task's per-run state.
///
/// Exposed for tests, reports and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    /// No run has been started yet.
    NotInRun,
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskRunState::Succeeded | TaskRunState::Failed | TaskRunState::Skipped
        )
    }
}

impl fmt::Display for TaskRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskRunState::NotInRun => "not_in_run",
            TaskRunState::Pending => "pending",
            TaskRunState::Running => "running",
            TaskRunState::Succeeded => "succeeded",
            TaskRunState::Failed => "failed",
            TaskRunState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::Succeeded) => TaskRunState::Succeeded,
            Some(RunState::Failed) => TaskRunState::Failed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task definition plus its state in the current run.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub action: TaskAction,
    pub join: JoinPolicy,
    /// Configured retry budget; copied into `retries_remaining` on each run.
    pub retries: u32,
    /// Direct dependencies.
    pub deps: Vec<TaskName>,

    /// Per-run state (None before the first run starts).
    pub run_state: Option<RunState>,
    pub retries_remaining: u32,
    /// Number of attempts dispatched in this run.
    pub attempts: u32,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    /// Failure detail of the last failed attempt.
    pub detail: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl TaskInfo {
    pub fn from_task(task: &Task, deps: Vec<TaskName>) -> Self {
        Self {
            name: task.id.clone(),
            action: task.action.clone(),
            join: task.join,
            retries: task.retries,
            deps,
            run_state: None,
            retries_remaining: task.retries,
            attempts: 0,
            started_at: None,
            finished_at: None,
            detail: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Forget everything from a previous run and go back to `Pending`.
    pub fn reset_for_run(&mut self) {
        self.run_state = Some(RunState::Pending);
        self.retries_remaining = self.retries;
        self.attempts = 0;
        self.started_at = None;
        self.finished_at = None;
        self.detail = None;
        self.stdout.clear();
        self.stderr.clear();
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: TaskAction,
    /// 1 for the first attempt, incremented on each retry.
    pub attempt: u32,
    /// All tasks dispatched for the same run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            action: info.action.clone(),
            attempt: info.attempts,
            run_id,
        }
    }
}
