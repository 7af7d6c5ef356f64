// src/exec/backend.rs

//! Seam between the runtime and whatever actually runs task actions.
//!
//! The runtime only ever hands over batches of [`ScheduledTask`]s; completions
//! come back later on the runtime's event channel. Production uses
//! [`RealExecutorBackend`], which feeds the executor loop in
//! [`executor_loop`](super::executor_loop). Tests substitute a scripted
//! backend that answers immediately.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::callable::CallableRegistry;
use super::executor_loop::spawn_executor;

/// Something that can start task attempts.
///
/// `spawn_ready_tasks` must return once the tasks are handed off, not when
/// they finish. Each attempt is expected to produce exactly one
/// `RuntimeEvent::TaskCompleted`.
pub trait ExecutorBackend: Send {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs shell commands and registered callables for real.
pub struct RealExecutorBackend {
    dispatch_tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Start the executor loop. Completions are reported on `runtime_tx`;
    /// callable tasks resolve their function in `registry`.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, registry: Arc<CallableRegistry>) -> Self {
        Self {
            dispatch_tx: spawn_executor(runtime_tx, registry),
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                trace!(task = %task.name, attempt = task.attempt, "handing task to executor loop");
                self.dispatch_tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
