// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::DagGraph;
use crate::engine::TaskName;
use crate::types::JoinPolicy;

/// Whether a pending task can start, given its join policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Some predecessor has not reached the state the policy needs yet.
    Waiting,
    /// The policy can never be met; the task must be skipped.
    Unsatisfiable,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Put every task back to `Pending` with a fresh retry budget.
    pub fn reset_all_pending(&mut self) {
        for info in self.tasks.values_mut() {
            info.reset_for_run();
        }
    }

    /// Mark the pending `AllSuccess` dependents of a failed task (and their
    /// `AllSuccess` dependents, transitively) as `Skipped`.
    ///
    /// Finalizers (`AllDone`) are left pending; [`collect_new_ready_tasks`]
    /// starts them once all their predecessors are terminal.
    ///
    /// Returns the newly skipped tasks, excluding the failed task itself.
    ///
    /// [`collect_new_ready_tasks`]: StateManager::collect_new_ready_tasks
    pub fn mark_dependents_skipped(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut visited: HashSet<TaskName> = HashSet::new();
        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            let Some(info) = self.tasks.get_mut(&name) else {
                warn!(task = %name, "node in DAG not present in tasks map");
                continue;
            };

            if info.join.is_finalizer() {
                debug!(task = %info.name, "finalizer left pending after upstream failure");
                continue;
            }

            if info.run_state == Some(RunState::Pending) {
                info.run_state = Some(RunState::Skipped);
                info.finished_at = Some(Instant::now());
                debug!(
                    task = %info.name,
                    upstream = %failed_task,
                    "marking dependent as Skipped due to upstream failure"
                );
                newly_skipped.push(info.name.clone());
                stack.extend(self.graph.dependents_of(&name).iter().cloned());
            }
        }

        newly_skipped
    }

    /// Settle every pending task whose join policy can now be decided.
    ///
    /// Ready tasks are marked `Running` and returned for dispatch; tasks whose
    /// policy became unsatisfiable are marked `Skipped`. Repeats until nothing
    /// changes, since a skip may complete the predecessors of a finalizer.
    pub fn collect_new_ready_tasks(&mut self) -> (Vec<ScheduledTask>, Vec<TaskName>) {
        let mut ready = Vec::new();
        let mut skipped = Vec::new();

        loop {
            // Decide first, then mutate to avoid borrowing issues.
            let ro = ReadOnlyStateManager::new(self.tasks);
            let mut decisions: Vec<(TaskName, Readiness)> = self
                .tasks
                .values()
                .filter(|info| info.run_state == Some(RunState::Pending))
                .filter_map(|info| match ro.readiness_of(info) {
                    Readiness::Waiting => None,
                    decided => Some((info.name.clone(), decided)),
                })
                .collect();

            if decisions.is_empty() {
                break;
            }
            decisions.sort_by(|a, b| a.0.cmp(&b.0));

            let mut changed_terminal = false;
            for (name, readiness) in decisions {
                let Some(info) = self.tasks.get_mut(&name) else {
                    continue;
                };

                match readiness {
                    Readiness::Ready => {
                        info.run_state = Some(RunState::Running);
                        info.attempts += 1;
                        info.started_at = Some(Instant::now());
                        info!(
                            task = %info.name,
                            run_id = self.current_run_id,
                            join = %info.join,
                            action = info.action.kind(),
                            "dependencies satisfied; scheduling task"
                        );
                        ready.push(ScheduledTask::from_task_info(
                            info,
                            self.current_run_id.unwrap_or(0),
                        ));
                    }
                    Readiness::Unsatisfiable => {
                        info.run_state = Some(RunState::Skipped);
                        info.finished_at = Some(Instant::now());
                        debug!(task = %info.name, "join policy unsatisfiable; marking Skipped");
                        skipped.push(info.name.clone());
                        changed_terminal = true;
                    }
                    Readiness::Waiting => {}
                }
            }

            // Only a new terminal state can unblock another pending task.
            if !changed_terminal {
                break;
            }
        }

        (ready, skipped)
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks
            .values()
            .all(|info| info.run_state.is_none_or(RunState::is_terminal))
    }
}

/// A read-only view for checking join policies.
///
/// Used when we only have shared access to the tasks map (e.g. in
/// `Scheduler::deps_satisfied`).
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Evaluate the join policy of `info` against its predecessors' states.
    pub fn readiness_of(&self, info: &TaskInfo) -> Readiness {
        let mut waiting = false;

        for dep_name in &info.deps {
            let Some(dep) = self.tasks.get(dep_name) else {
                warn!(
                    task = %info.name,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                return Readiness::Waiting;
            };

            match (info.join, dep.run_state) {
                (JoinPolicy::AllSuccess, Some(RunState::Succeeded)) => {}
                (JoinPolicy::AllSuccess, Some(RunState::Failed | RunState::Skipped)) => {
                    return Readiness::Unsatisfiable;
                }
                (JoinPolicy::AllDone, Some(state)) if state.is_terminal() => {}
                _ => waiting = true,
            }
        }

        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }
}
