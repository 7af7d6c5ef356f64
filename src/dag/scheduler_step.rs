// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks to dispatch now, including retried ones.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that failed permanently in this step.
    pub newly_failed: Vec<TaskName>,
    /// Tasks that were skipped in this step because their join policy can
    /// no longer be met.
    pub newly_skipped: Vec<TaskName>,
    /// Tasks that failed but were re-dispatched because retries remained.
    pub retried: Vec<TaskName>,
    /// Whether this step finished the current run.
    pub run_just_finished: bool,
}
