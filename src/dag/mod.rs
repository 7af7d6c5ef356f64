// src/dag/mod.rs

//! Task graph model and the per-run scheduler.
//!
//! A pipeline goes through two phases. [`GraphBuilder`] turns task specs into
//! an immutable, validated [`DagGraph`] (no duplicates, no dangling
//! references, no cycles, every placeholder resolved). A [`Scheduler`] then
//! owns that graph and tracks one run at a time: which tasks are ready under
//! their join policy, which failed, and which were skipped.

pub mod builder;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;
pub mod task_info;

pub use builder::GraphBuilder;
pub use graph::DagGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{Kwargs, Task, TaskAction, TaskSpec};
pub use task_info::{ScheduledTask, TaskRunState};
