// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for
//! reading events from channels and sending `ScheduledTask`s to the executor.
//!
//! The core is intended to be unit tested without any Tokio, channels,
//! filesystem, or processes.

use crate::dag::Scheduler;
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{handle_run_start, handle_task_completion, CoreStep};
use crate::report::RunReport;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn report(&self) -> RunReport {
        self.scheduler.report()
    }

    /// Begin a fresh run; returns the root tasks to dispatch.
    pub fn start(&mut self) -> CoreStep {
        handle_run_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted {
                task,
                attempt,
                outcome,
                output,
            } => handle_task_completion(&mut self.scheduler, task, attempt, outcome, output),
        }
    }
}
