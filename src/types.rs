use std::fmt;

use serde::{Deserialize, Serialize};

/// How a task decides it is ready once its predecessors have moved.
///
/// - `AllSuccess`: every predecessor must have succeeded. If any of them
///   fails (or is skipped), this task is skipped and never runs (default).
/// - `AllDone`: every predecessor must have reached a terminal state, whatever
///   the outcome. Used for finalizers such as cleanup, which must run after
///   the branches they guard win or lose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    #[default]
    AllSuccess,
    AllDone,
}

impl JoinPolicy {
    pub fn is_finalizer(self) -> bool {
        matches!(self, JoinPolicy::AllDone)
    }
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinPolicy::AllSuccess => f.write_str("all_success"),
            JoinPolicy::AllDone => f.write_str("all_done"),
        }
    }
}

/// Overall outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Succeeded => f.write_str("succeeded"),
            PipelineStatus::Failed => f.write_str("failed"),
        }
    }
}
