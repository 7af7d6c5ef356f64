// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info};

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::{TaskName, TaskOutcome, TaskOutput};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Every task is terminal; the run is over.
    FinishRun,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Start a new run from the DAG roots.
pub fn handle_run_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.step_start();
    core_step_from(step)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskName,
    attempt: u32,
    outcome: TaskOutcome,
    output: TaskOutput,
) -> CoreStep {
    debug!(task = %task, attempt, success = outcome.is_success(), "handling task completion");

    scheduler.record_output(&task, output);
    let step = scheduler.step_completion(&task, outcome);

    if !step.newly_skipped.is_empty() {
        info!(skipped = ?step.newly_skipped, "tasks skipped after upstream failure");
    }

    core_step_from(step)
}

fn core_step_from(step: SchedulerStep) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let keep_running = !step.run_just_finished;
    if step.run_just_finished {
        commands.push(CoreCommand::FinishRun);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
