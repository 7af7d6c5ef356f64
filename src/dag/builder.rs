// src/dag/builder.rs

//! Graph construction and validation.
//!
//! The builder collects task specs and dependency relations, then
//! [`GraphBuilder::build`] checks them in this order:
//! 1. duplicate task ids
//! 2. references to unknown tasks
//! 3. cycles (depth-first search with a recursion stack)
//! 4. `{{var.NAME}}` placeholders against the variable store
//!
//! Nothing is executed until all of these pass.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::dag::graph::{DagGraph, DagNode};
use crate::dag::task::{Task, TaskAction, TaskSpec};
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::vars::VariableStore;

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    specs: Vec<TaskSpec>,
    /// Extra `(predecessor, successor)` relations on top of each spec's `after`.
    edges: Vec<(TaskName, TaskName)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, spec: TaskSpec) -> Self {
        self.add_task(spec);
        self
    }

    pub fn add_task(&mut self, spec: TaskSpec) {
        self.specs.push(spec);
    }

    /// `a >> b`
    pub fn precedes(mut self, a: impl Into<TaskName>, b: impl Into<TaskName>) -> Self {
        self.add_edge(a, b);
        self
    }

    /// `a >> [b, c, ...]`
    pub fn fan_out<I, S>(mut self, a: impl Into<TaskName>, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let a = a.into();
        for b in successors {
            self.add_edge(a.clone(), b);
        }
        self
    }

    /// `[a, b, ...] >> c`
    pub fn fan_in<I, S>(mut self, predecessors: I, c: impl Into<TaskName>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let c = c.into();
        for a in predecessors {
            self.add_edge(a, c.clone());
        }
        self
    }

    pub fn add_edge(&mut self, a: impl Into<TaskName>, b: impl Into<TaskName>) {
        self.edges.push((a.into(), b.into()));
    }

    /// Validate everything and produce an immutable graph.
    pub fn build(&self, vars: &VariableStore) -> Result<DagGraph> {
        let mut specs: BTreeMap<&str, &TaskSpec> = BTreeMap::new();
        for spec in &self.specs {
            if specs.insert(spec.id.as_str(), spec).is_some() {
                return Err(PipelineError::DuplicateTask(spec.id.clone()));
            }
        }

        let mut nodes: BTreeMap<TaskName, DagNode> = specs
            .keys()
            .map(|id| (id.to_string(), DagNode::default()))
            .collect();

        let relations = self
            .specs
            .iter()
            .flat_map(|spec| spec.after.iter().map(move |dep| (dep, &spec.id)))
            .chain(self.edges.iter().map(|(a, b)| (a, b)));

        let mut edge_set: BTreeSet<(TaskName, TaskName)> = BTreeSet::new();
        for (pred, succ) in relations {
            for (endpoint, other) in [(pred, succ), (succ, pred)] {
                if !specs.contains_key(endpoint.as_str()) {
                    return Err(PipelineError::DanglingReference {
                        task: other.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            edge_set.insert((pred.clone(), succ.clone()));
        }

        // BTreeSet iteration keeps both adjacency lists sorted.
        for (pred, succ) in edge_set {
            if let Some(node) = nodes.get_mut(&succ) {
                node.deps.push(pred.clone());
            }
            if let Some(node) = nodes.get_mut(&pred) {
                node.dependents.push(succ);
            }
        }

        if let Some(cycle) = find_cycle(&nodes) {
            return Err(PipelineError::CycleDetected { cycle });
        }

        let mut tasks = BTreeMap::new();
        for (id, spec) in specs {
            let task = Task {
                id: id.to_string(),
                action: resolve_action(id, &spec.action, vars)?,
                join: spec.join,
                retries: spec.retries,
            };
            tasks.insert(id.to_string(), task);
        }

        debug!(tasks = tasks.len(), "task graph built");
        Ok(DagGraph::from_parts(tasks, nodes))
    }
}

fn resolve_action(task: &str, action: &TaskAction, vars: &VariableStore) -> Result<TaskAction> {
    let render = |template: &str| {
        vars.render(template)
            .map_err(|variable| PipelineError::UnresolvedVariable {
                task: task.to_string(),
                variable,
            })
    };

    match action {
        TaskAction::ShellCommand { command } => Ok(TaskAction::ShellCommand {
            command: render(command.as_str())?,
        }),
        TaskAction::Callable { function, kwargs } => {
            let mut resolved = BTreeMap::new();
            for (key, value) in kwargs {
                resolved.insert(key.clone(), render(value.as_str())?);
            }
            Ok(TaskAction::Callable {
                function: function.clone(),
                kwargs: resolved,
            })
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth-first search for a cycle.
///
/// Returns the cycle as a path whose first and last entries are the same
/// task, e.g. `["A", "B", "A"]`.
fn find_cycle(nodes: &BTreeMap<TaskName, DagNode>) -> Option<Vec<TaskName>> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();

    for start in nodes.keys() {
        if marks.contains_key(start.as_str()) {
            continue;
        }
        if let Some(cycle) = visit(start, nodes, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    name: &'a str,
    nodes: &'a BTreeMap<TaskName, DagNode>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<TaskName>> {
    marks.insert(name, Mark::InProgress);
    stack.push(name);

    let dependents = nodes.get(name).map(|n| n.dependents.as_slice()).unwrap_or(&[]);
    for next in dependents {
        match marks.get(next.as_str()) {
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                let mut cycle: Vec<TaskName> =
                    stack[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                if let Some(cycle) = visit(next, nodes, marks, stack) {
                    return Some(cycle);
                }
            }
        }
    }

    stack.pop();
    marks.insert(name, Mark::Done);
    None
}
