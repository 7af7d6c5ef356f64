// src/exec/callable.rs

//! Callable executor: in-process functions invoked with keyword arguments.
//!
//! Functions are registered by name in a [`CallableRegistry`]. The pipeline
//! only refers to them by that name, so the set of things a task can call is
//! fixed before the graph is built.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::dag::{DagGraph, Kwargs, TaskAction};
use crate::engine::TaskOutcome;
use crate::errors::PipelineError;

/// Signature of a registered function.
///
/// Returning `Err` fails the task with the error's message as detail.
pub type CallableFn = Arc<dyn Fn(&Kwargs) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CallableRegistry {
    functions: BTreeMap<String, CallableFn>,
}

impl fmt::Debug for CallableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CallableRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with `create_dir` and `remove_dir`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("create_dir", create_dir);
        registry.register("remove_dir", remove_dir);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Kwargs) -> Result<()> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<CallableFn> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Reject the graph if any callable task names a function that is not
    /// registered.
    pub fn ensure_known(&self, graph: &DagGraph) -> crate::errors::Result<()> {
        for name in graph.tasks() {
            if let Some(TaskAction::Callable { function, .. }) = graph.task(name).map(|t| &t.action) {
                if !self.contains(function) {
                    return Err(PipelineError::UnknownCallable {
                        task: name.to_string(),
                        function: function.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Run a registered function on the blocking pool.
///
/// Unknown names, returned errors and panics all become a failed outcome.
pub async fn run_callable(
    registry: &CallableRegistry,
    task: &str,
    run_id: u64,
    function: &str,
    kwargs: &Kwargs,
) -> TaskOutcome {
    let Some(f) = registry.get(function) else {
        return TaskOutcome::failed(format!("unknown callable '{function}'"));
    };

    info!(task = %task, run_id, function = %function, "calling task function");

    let kwargs = kwargs.clone();
    let result = tokio::task::spawn_blocking(move || f(&kwargs)).await;

    match result {
        Ok(Ok(())) => {
            debug!(task = %task, function = %function, "task function returned");
            TaskOutcome::Success
        }
        Ok(Err(err)) => TaskOutcome::failed(format!("{err:#}")),
        Err(join_err) if join_err.is_panic() => {
            TaskOutcome::failed(format!("callable '{function}' panicked"))
        }
        Err(join_err) => TaskOutcome::failed(join_err.to_string()),
    }
}

/// Fetch a required keyword argument.
pub fn required_kwarg<'a>(kwargs: &'a Kwargs, name: &str) -> Result<&'a str> {
    kwargs
        .get(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("missing keyword argument '{name}'"))
}

/// `create_dir(path)`: create a directory and any missing parents.
fn create_dir(kwargs: &Kwargs) -> Result<()> {
    let path = Path::new(required_kwarg(kwargs, "path")?);
    std::fs::create_dir_all(path)
        .with_context(|| format!("creating directory {}", path.display()))
}

/// `remove_dir(path)`: remove a directory tree. A missing directory is an
/// error.
fn remove_dir(kwargs: &Kwargs) -> Result<()> {
    let path = Path::new(required_kwarg(kwargs, "path")?);
    std::fs::remove_dir_all(path)
        .with_context(|| format!("removing directory {}", path.display()))
}
