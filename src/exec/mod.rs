// src/exec/mod.rs

//! Task execution layer.
//!
//! This module actually runs task actions and reports back to the
//! orchestration runtime via `RuntimeEvent`s.
//!
//! - [`shell`] runs `ShellCommand` actions with `tokio::process::Command`.
//! - [`callable`] runs `Callable` actions from a [`CallableRegistry`].
//! - [`task_runner`] picks the strategy for one scheduled task.
//! - [`executor_loop`] owns the loop that spawns one Tokio task per
//!   scheduled task.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod callable;
pub mod executor_loop;
pub mod shell;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use callable::{CallableFn, CallableRegistry};
pub use executor_loop::spawn_executor;
