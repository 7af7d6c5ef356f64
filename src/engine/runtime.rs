// src/engine/runtime.rs

use std::fmt;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::exec::ExecutorBackend;
use crate::report::RunReport;

use super::core::CoreRuntime;
use super::event_handlers::CoreStep;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`] for a single pipeline run.
///
/// The runtime is the only writer of scheduler state. Tasks finish
/// concurrently, but their completion events queue up on `event_rx` and are
/// applied one at a time; every batch of newly ready tasks goes to the
/// `ExecutorBackend`.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    events_handled: usize,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("events_handled", &self.events_handled)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            events_handled: 0,
        }
    }

    /// Run every task to a terminal state and return the report.
    ///
    /// Fails only if the event channel closes while tasks are still in
    /// flight, or the backend refuses a dispatch. Task failures end up in
    /// the report instead.
    pub async fn run(mut self) -> Result<RunReport> {
        let started = Instant::now();
        info!("runtime started");

        let mut step = self.core.start();
        while self.apply(step).await? {
            let event = self.next_event().await?;
            step = self.core.step(event);
            self.events_handled += 1;
        }

        let report = self.core.report();
        info!(
            status = %report.status,
            run_id = report.run_id,
            events = self.events_handled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "runtime exiting"
        );
        Ok(report)
    }

    /// Carry out the commands of one core step. Returns whether the run is
    /// still going.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) if !tasks.is_empty() => {
                    let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
                    debug!(?names, "dispatching ready tasks");
                    self.executor.spawn_ready_tasks(tasks).await?;
                }
                CoreCommand::DispatchTasks(_) => {}
                CoreCommand::FinishRun => info!("all tasks terminal"),
            }
        }
        Ok(step.keep_running)
    }

    async fn next_event(&mut self) -> Result<RuntimeEvent> {
        let event = self.event_rx.recv().await.ok_or_else(|| {
            PipelineError::Other(anyhow!(
                "runtime event channel closed while tasks were still running: {:?}",
                self.core.scheduler().running_tasks()
            ))
        })?;
        debug!(?event, "runtime received event");
        Ok(event)
    }
}
