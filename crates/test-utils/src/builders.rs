#![allow(dead_code)]

use std::collections::BTreeMap;

use forecast_dag::config::{ConfigFile, DefaultSection, PipelineSection, RawConfigFile, TaskConfig};
use forecast_dag::dag::{DagGraph, GraphBuilder, TaskSpec};
use forecast_dag::types::JoinPolicy;
use forecast_dag::vars::VariableStore;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection::default(),
                vars: BTreeMap::new(),
                default: DefaultSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.config.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_required_var(mut self, key: &str) -> Self {
        self.config.pipeline.required_vars.push(key.to_string());
        self
    }

    pub fn with_default_retries(mut self, retries: u32) -> Self {
        self.config.default.retries = retries;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn shell(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn callable(function: &str) -> Self {
        Self {
            task: TaskConfig {
                callable: Some(function.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn kwarg(mut self, key: &str, value: &str) -> Self {
        self.task.kwargs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn join(mut self, join: JoinPolicy) -> Self {
        self.task.join = join;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.task.retries = Some(retries);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// The forecasting pipeline shape used across the scenario tests:
///
/// ```text
/// Prepare -> [FetchHumidity, FetchTemperature] -> Merge -> [TrainA, TrainB]
///   -> Clone -> [TestA, TestB]; TestA -> DeployA; TestB -> DeployB;
/// [DeployA, DeployB] -> Cleanup (all_done)
/// ```
pub fn forecast_builder() -> GraphBuilder {
    GraphBuilder::new()
        .task(TaskSpec::shell("Prepare", "mkdir -p {{var.path_workflow}}"))
        .task(TaskSpec::shell("FetchHumidity", "wget {{var.path_workflow}}/humidity.csv.zip"))
        .task(TaskSpec::shell("FetchTemperature", "wget {{var.path_workflow}}/temperature.csv.zip"))
        .task(TaskSpec::callable(
            "Merge",
            "merge_datasets",
            [("hum_file", "{{var.path_workflow}}/humidity.csv")],
        ))
        .task(TaskSpec::callable("TrainA", "train_arima", [("path", "/models")]))
        .task(TaskSpec::callable("TrainB", "train_random_forest", [("path", "/models")]))
        .task(TaskSpec::shell("Clone", "git clone repo {{var.path_workflow}}/services"))
        .task(TaskSpec::shell("TestA", "python3 test.py v1"))
        .task(TaskSpec::shell("TestB", "python3 test.py v2"))
        .task(TaskSpec::shell("DeployA", "docker run api_v1"))
        .task(TaskSpec::shell("DeployB", "docker run api_v2"))
        .task(TaskSpec::callable("Cleanup", "remove_dir", [("path", "{{var.path_workflow}}")]).finalizer())
        .fan_out("Prepare", ["FetchHumidity", "FetchTemperature"])
        .fan_in(["FetchHumidity", "FetchTemperature"], "Merge")
        .fan_out("Merge", ["TrainA", "TrainB"])
        .fan_in(["TrainA", "TrainB"], "Clone")
        .fan_out("Clone", ["TestA", "TestB"])
        .precedes("TestA", "DeployA")
        .precedes("TestB", "DeployB")
        .fan_in(["DeployA", "DeployB"], "Cleanup")
}

pub fn forecast_vars() -> VariableStore {
    VariableStore::new().with("path_workflow", "/tmp/forecast-workflow")
}

pub fn forecast_graph() -> DagGraph {
    forecast_builder()
        .build(&forecast_vars())
        .expect("forecast graph is valid")
}
