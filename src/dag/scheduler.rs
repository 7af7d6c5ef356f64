use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, Readiness, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome, TaskOutput};
use crate::report::{RunReport, TaskReport};
use crate::types::PipelineStatus;

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - seeding a run with the tasks that have no dependencies
/// - deciding when a task is ready, according to its join policy
/// - marking tasks as succeeded/failed, and re-dispatching retries
/// - skipping dependents of failed tasks
/// - producing the final [`RunReport`]
///
/// It performs no IO; the runtime owns it and feeds it completion events one
/// at a time.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
    run_started_at: Option<Instant>,
    run_finished_at: Option<Instant>,
}

impl Scheduler {
    pub fn new(graph: DagGraph) -> Self {
        let mut tasks = HashMap::new();

        for name in graph.tasks() {
            let Some(task) = graph.task(name) else {
                continue;
            };
            let deps = graph.dependencies_of(name).to_vec();
            tasks.insert(name.to_string(), TaskInfo::from_task(task, deps));
        }

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
            run_started_at: None,
            run_finished_at: None,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Retries left for `task` in the current run.
    pub fn retries_remaining(&self, task: &str) -> Option<u32> {
        self.tasks.get(task).map(|info| info.retries_remaining)
    }

    /// Whether the join policy of `task` is currently met.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let ro = ReadOnlyStateManager::new(&self.tasks);
        Some(ro.readiness_of(info) == Readiness::Ready)
    }

    /// Names of tasks currently dispatched and not yet completed.
    pub fn running_tasks(&self) -> Vec<TaskName> {
        let mut running: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| info.run_state == Some(RunState::Running))
            .map(|info| info.name.clone())
            .collect();
        running.sort();
        running
    }

    /// Start a new run from scratch and return the root tasks to dispatch.
    pub fn start_new_run(&mut self) -> Vec<ScheduledTask> {
        self.step_start().newly_scheduled
    }

    /// Handle completion of a task attempt (production API).
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `start_new_run` that returns a rich [`SchedulerStep`].
    pub fn step_start(&mut self) -> SchedulerStep {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        self.run_started_at = Some(Instant::now());
        self.run_finished_at = None;

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        manager.reset_all_pending();
        let (newly_scheduled, newly_skipped) = manager.collect_new_ready_tasks();

        info!(
            run_id = self.run_counter,
            tasks = self.tasks.len(),
            roots = newly_scheduled.len(),
            "scheduler: starting new DAG run"
        );

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_just_finished,
            ..SchedulerStep::default()
        }
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Attach captured stdout/stderr to a task; later attempts overwrite
    /// earlier ones.
    pub fn record_output(&mut self, task: &str, output: TaskOutput) {
        if let Some(info) = self.tasks.get_mut(task) {
            info.stdout = output.stdout;
            info.stderr = output.stderr;
        }
    }

    /// Snapshot of the current (or last finished) run.
    pub fn report(&self) -> RunReport {
        let order = self.graph.topological_order().unwrap_or_else(|_| {
            let mut names: Vec<TaskName> = self.tasks.keys().cloned().collect();
            names.sort();
            names
        });

        let mut tasks = Vec::with_capacity(order.len());
        let mut failed = Vec::new();
        let mut skipped = Vec::new();

        for name in order {
            let Some(info) = self.tasks.get(&name) else {
                continue;
            };
            let status: TaskRunState = info.run_state.into();
            match status {
                TaskRunState::Failed => failed.push(name.clone()),
                TaskRunState::Skipped => skipped.push(name.clone()),
                _ => {}
            }
            tasks.push(TaskReport {
                id: name,
                status,
                attempts: info.attempts,
                duration_ms: info.duration().map(|d| d.as_millis() as u64),
                detail: info.detail.clone(),
                stdout: info.stdout.clone(),
                stderr: info.stderr.clone(),
            });
        }

        let status = if tasks.iter().all(|t| t.status == TaskRunState::Succeeded) {
            PipelineStatus::Succeeded
        } else {
            PipelineStatus::Failed
        };

        let duration_ms = match (self.run_started_at, self.run_finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).as_millis() as u64,
            (Some(start), None) => start.elapsed().as_millis() as u64,
            _ => 0,
        };

        RunReport {
            pipeline: String::new(),
            run_id: self.run_counter,
            status,
            duration_ms,
            tasks,
            failed,
            skipped,
        }
    }

    /// Determine whether all tasks are in a terminal state and clear
    /// `current_run_id` if so.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
            self.run_finished_at = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Internal implementation of `handle_completion` / `step_completion`.
    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(
                    task = %task,
                    "handle_completion called with no active run; ignoring"
                );
                return SchedulerStep::default();
            }
        };

        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return step;
        };

        if info.run_state != Some(RunState::Running) {
            warn!(
                task = %task,
                state = ?info.run_state,
                "completion for task that is not running; ignoring"
            );
            return step;
        }

        match outcome {
            TaskOutcome::Success => {
                info.run_state = Some(RunState::Succeeded);
                info.finished_at = Some(Instant::now());
                info.detail = None;
                debug!(task = %info.name, run_id, attempt = info.attempts, "task succeeded");
            }
            TaskOutcome::Failed { detail } if info.retries_remaining > 0 => {
                info.retries_remaining -= 1;
                info.attempts += 1;
                warn!(
                    task = %info.name,
                    run_id,
                    attempt = info.attempts,
                    retries_remaining = info.retries_remaining,
                    detail = %detail,
                    "task failed; retrying immediately"
                );
                info.detail = Some(detail);
                step.retried.push(info.name.clone());
                step.newly_scheduled
                    .push(ScheduledTask::from_task_info(info, run_id));
                return step;
            }
            TaskOutcome::Failed { detail } => {
                info.run_state = Some(RunState::Failed);
                info.finished_at = Some(Instant::now());
                warn!(
                    task = %info.name,
                    run_id,
                    attempts = info.attempts,
                    detail = %detail,
                    "task failed; skipping dependents in this run"
                );
                info.detail = Some(detail);
                step.newly_failed.push(info.name.clone());

                let mut manager =
                    StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                step.newly_skipped = manager.mark_dependents_skipped(task);
            }
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let (ready, mut skipped) = manager.collect_new_ready_tasks();
        step.newly_scheduled.extend(ready);
        step.newly_skipped.append(&mut skipped);

        step.run_just_finished = self.maybe_finish_run();
        step
    }
}
