// src/exec/task_runner.rs

//! Runs one scheduled task attempt and reports its completion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::error;

use crate::dag::{ScheduledTask, TaskAction};
use crate::engine::{RuntimeEvent, TaskOutcome, TaskOutput};
use crate::exec::callable::{run_callable, CallableRegistry};
use crate::exec::shell::run_shell;

/// Execute `task` with the strategy its action selects and send exactly one
/// `TaskCompleted` event back to the runtime.
///
/// Errors that prevent the action from running at all (e.g. the shell cannot
/// be spawned) are reported as a failed outcome, not propagated.
pub async fn run_task(
    task: ScheduledTask,
    registry: Arc<CallableRegistry>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let (outcome, output) = match &task.action {
        TaskAction::ShellCommand { command } => {
            match run_shell(&task.name, task.run_id, command).await {
                Ok(result) => result,
                Err(err) => {
                    error!(
                        task = %task.name,
                        run_id = task.run_id,
                        error = %err,
                        "task execution error"
                    );
                    (TaskOutcome::failed(format!("{err:#}")), TaskOutput::default())
                }
            }
        }
        TaskAction::Callable { function, kwargs } => {
            let outcome = run_callable(&registry, &task.name, task.run_id, function, kwargs).await;
            (outcome, TaskOutput::default())
        }
    };

    let event = RuntimeEvent::TaskCompleted {
        task: task.name.clone(),
        attempt: task.attempt,
        outcome,
        output,
    };

    if runtime_tx.send(event).await.is_err() {
        error!(
            task = %task.name,
            run_id = task.run_id,
            "runtime dropped before task completion could be reported"
        );
    }
}
