use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use forecast_dag::dag::ScheduledTask;
use forecast_dag::engine::{RuntimeEvent, TaskOutcome, TaskOutput};
use forecast_dag::exec::ExecutorBackend;
use forecast_dag::errors::Result;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports a completion for each scheduled task, failing the
///   ones it was told to fail.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    /// Task name -> number of attempts that should still fail.
    /// `u32::MAX` means "always fail".
    failures: HashMap<String, u32>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    /// Every attempt of `task` fails.
    pub fn failing(mut self, task: &str) -> Self {
        self.failures.insert(task.to_string(), u32::MAX);
        self
    }

    /// The first `times` attempts of `task` fail, later ones succeed.
    pub fn failing_times(mut self, task: &str, times: u32) -> Self {
        self.failures.insert(task.to_string(), times);
        self
    }

    fn outcome_for(&mut self, task: &str) -> TaskOutcome {
        match self.failures.get_mut(task) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                TaskOutcome::failed(format!("{task} failed"))
            }
            _ => TaskOutcome::Success,
        }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for t in tasks {
                self.executed.lock().unwrap().push(t.name.clone());
                let outcome = self.outcome_for(&t.name);

                self.runtime_tx
                    .send(RuntimeEvent::TaskCompleted {
                        task: t.name.clone(),
                        attempt: t.attempt,
                        outcome,
                        output: TaskOutput::default(),
                    })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
