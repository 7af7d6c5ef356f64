// src/exec/executor_loop.rs

//! Main executor loop that dispatches scheduled tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::callable::CallableRegistry;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what `RealExecutorBackend`
/// forwards scheduled tasks into. Each scheduled task is executed in its own
/// Tokio task, so independent tasks run in parallel and a slow task never
/// holds up the dispatch of the others.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    registry: Arc<CallableRegistry>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(task) = rx.recv().await {
            debug!(
                task = %task.name,
                run_id = task.run_id,
                attempt = task.attempt,
                "dispatching task"
            );
            let runtime_tx = runtime_tx.clone();
            let registry = Arc::clone(&registry);
            tokio::spawn(run_task(task, registry, runtime_tx));
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
