// src/dag/task.rs

//! Immutable task definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::engine::TaskName;
use crate::types::JoinPolicy;

/// Keyword arguments bound to a callable task.
pub type Kwargs = BTreeMap<String, String>;

/// What a task actually does when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskAction {
    /// A command line run through the platform shell.
    ShellCommand { command: String },
    /// An in-process function looked up by name in the callable registry.
    Callable { function: String, kwargs: Kwargs },
}

impl TaskAction {
    pub fn shell(command: impl Into<String>) -> Self {
        TaskAction::ShellCommand {
            command: command.into(),
        }
    }

    pub fn callable<K, V, I>(function: impl Into<String>, kwargs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        TaskAction::Callable {
            function: function.into(),
            kwargs: kwargs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::ShellCommand { .. } => "shell",
            TaskAction::Callable { .. } => "callable",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::ShellCommand { command } => write!(f, "sh: {command}"),
            TaskAction::Callable { function, kwargs } => {
                write!(f, "call: {function}(")?;
                for (i, (k, v)) in kwargs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v:?}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Declarative task as written by the pipeline author, before variables are
/// substituted and edges are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: TaskName,
    pub action: TaskAction,
    /// Direct predecessors (`after = [...]`).
    pub after: Vec<TaskName>,
    pub join: JoinPolicy,
    pub retries: u32,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskName>, action: TaskAction) -> Self {
        Self {
            id: id.into(),
            action,
            after: Vec::new(),
            join: JoinPolicy::default(),
            retries: 0,
        }
    }

    pub fn shell(id: impl Into<TaskName>, command: impl Into<String>) -> Self {
        Self::new(id, TaskAction::shell(command))
    }

    pub fn callable<K, V, I>(id: impl Into<TaskName>, function: impl Into<String>, kwargs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(id, TaskAction::callable(function, kwargs))
    }

    pub fn after(mut self, dep: impl Into<TaskName>) -> Self {
        self.after.push(dep.into());
        self
    }

    pub fn join(mut self, join: JoinPolicy) -> Self {
        self.join = join;
        self
    }

    /// Shorthand for `join(JoinPolicy::AllDone)`.
    pub fn finalizer(self) -> Self {
        self.join(JoinPolicy::AllDone)
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// A fully resolved task inside a built [`DagGraph`](crate::dag::DagGraph).
///
/// Placeholders in the action have already been substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskName,
    pub action: TaskAction,
    pub join: JoinPolicy,
    pub retries: u32,
}
