use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DagNode {
    /// Direct dependencies: tasks that must finish before this one can run.
    pub(crate) deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    pub(crate) dependents: Vec<TaskName>,
}

/// Immutable, validated task graph for one pipeline.
///
/// Only [`GraphBuilder`](crate::dag::GraphBuilder) constructs this, so every
/// edge endpoint exists and the edge set is acyclic. Adjacency lists are kept
/// sorted, which makes two builds from the same input compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagGraph {
    tasks: BTreeMap<TaskName, Task>,
    nodes: BTreeMap<TaskName, DagNode>,
}

impl DagGraph {
    pub(crate) fn from_parts(
        tasks: BTreeMap<TaskName, Task>,
        nodes: BTreeMap<TaskName, DagNode>,
    ) -> Self {
        Self { tasks, nodes }
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Resolved definition of a task.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks with no dependencies; these seed every run.
    pub fn roots(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All `(predecessor, successor)` pairs, sorted.
    pub fn edges(&self) -> Vec<(TaskName, TaskName)> {
        let mut edges: Vec<(TaskName, TaskName)> = self
            .nodes
            .iter()
            .flat_map(|(name, node)| {
                node.deps
                    .iter()
                    .map(move |dep| (dep.clone(), name.clone()))
            })
            .collect();
        edges.sort();
        edges
    }

    /// One valid execution order (used for dry-run output and reports).
    pub fn topological_order(&self) -> Result<Vec<TaskName>> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
            Err(cycle) => Err(PipelineError::CycleDetected {
                cycle: vec![cycle.node_id().to_string()],
            }),
        }
    }
}
