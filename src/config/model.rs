// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::{GraphBuilder, TaskAction, TaskSpec};
use crate::types::JoinPolicy;

/// Pipeline description as read from a TOML file, before validation.
///
/// ```toml
/// [pipeline]
/// name = "ccsa-forecast"
/// required_vars = ["path_workflow"]
///
/// [vars]
/// path_workflow = "/tmp/workflow"
///
/// [default]
/// retries = 0
///
/// [task.PrepareEnvironment]
/// cmd = "mkdir -p {{var.value.path_workflow}}"
///
/// [task.CleanUp]
/// callable = "remove_dir"
/// kwargs = { path = "{{var.value.path_workflow}}" }
/// after = ["DeployAPIv1", "DeployAPIv2"]
/// join = "all_done"
/// ```
///
/// All sections except `[task.*]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Lowest-precedence variable values.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated pipeline description.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so every task has
/// exactly one action.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub vars: BTreeMap<String, String>,
    pub default: DefaultSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            pipeline: raw.pipeline,
            vars: raw.vars,
            default: raw.default,
            task: raw.task,
        }
    }

    /// Task specs in id order, with `[default]` values applied.
    pub fn task_specs(&self) -> Vec<TaskSpec> {
        self.task
            .iter()
            .filter_map(|(name, tc)| tc.to_spec(name, self.default.retries))
            .collect()
    }

    /// A graph builder holding every task and its `after` relations.
    pub fn graph_builder(&self) -> GraphBuilder {
        self.task_specs()
            .into_iter()
            .fold(GraphBuilder::new(), |builder, spec| builder.task(spec))
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Variables that must be present before the graph is built.
    #[serde(default)]
    pub required_vars: Vec<String>,
}

fn default_pipeline_name() -> String {
    "pipeline".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            description: None,
            required_vars: Vec::new(),
        }
    }
}

/// `[default]` section: values applied to tasks that do not override them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultSection {
    #[serde(default)]
    pub retries: u32,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Shell command template. Mutually exclusive with `callable`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Name of a registered function. Mutually exclusive with `cmd`.
    #[serde(default)]
    pub callable: Option<String>,

    /// Keyword arguments for `callable`; values may contain placeholders.
    #[serde(default)]
    pub kwargs: BTreeMap<String, String>,

    /// This task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// `"all_success"` (default) or `"all_done"`.
    #[serde(default)]
    pub join: JoinPolicy,

    /// Overrides `[default].retries`.
    #[serde(default)]
    pub retries: Option<u32>,
}

impl TaskConfig {
    pub fn effective_retries(&self, default_retries: u32) -> u32 {
        self.retries.unwrap_or(default_retries)
    }

    /// The action this task performs, or `None` unless exactly one of
    /// `cmd` / `callable` is set.
    pub fn action(&self) -> Option<TaskAction> {
        match (&self.cmd, &self.callable) {
            (Some(cmd), None) => Some(TaskAction::shell(cmd.clone())),
            (None, Some(function)) => Some(TaskAction::Callable {
                function: function.clone(),
                kwargs: self.kwargs.clone(),
            }),
            _ => None,
        }
    }

    pub fn to_spec(&self, name: &str, default_retries: u32) -> Option<TaskSpec> {
        let spec = TaskSpec {
            id: name.to_string(),
            action: self.action()?,
            after: self.after.clone(),
            join: self.join,
            retries: self.effective_retries(default_retries),
        };
        Some(spec)
    }
}
