// tests/graph_builder.rs

mod common;
use crate::common::builders::{forecast_builder, forecast_graph, forecast_vars};
use crate::common::init_tracing;

use std::collections::BTreeSet;

use forecast_dag::dag::{GraphBuilder, TaskAction, TaskSpec};
use forecast_dag::errors::PipelineError;
use forecast_dag::types::JoinPolicy;
use forecast_dag::vars::VariableStore;

#[test]
fn acyclic_spec_builds_with_identical_task_set() {
    init_tracing();

    let graph = forecast_graph();

    let ids: BTreeSet<&str> = graph.tasks().collect();
    let expected: BTreeSet<&str> = [
        "Prepare",
        "FetchHumidity",
        "FetchTemperature",
        "Merge",
        "TrainA",
        "TrainB",
        "Clone",
        "TestA",
        "TestB",
        "DeployA",
        "DeployB",
        "Cleanup",
    ]
    .into_iter()
    .collect();
    assert_eq!(ids, expected);

    assert_eq!(graph.roots(), vec!["Prepare".to_string()]);
    assert_eq!(graph.dependencies_of("Merge"), ["FetchHumidity", "FetchTemperature"]);
    assert_eq!(graph.dependents_of("Clone"), ["TestA", "TestB"]);
    assert_eq!(graph.task("Cleanup").map(|t| t.join), Some(JoinPolicy::AllDone));
    assert_eq!(graph.task("Merge").map(|t| t.join), Some(JoinPolicy::AllSuccess));
}

#[test]
fn topological_order_respects_every_edge() {
    let graph = forecast_graph();
    let order = graph.topological_order().unwrap();
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();

    for (pred, succ) in graph.edges() {
        assert!(pos(&pred) < pos(&succ), "{pred} must come before {succ}");
    }
}

#[test]
fn building_twice_yields_equal_graphs() {
    let builder = forecast_builder();
    let vars = forecast_vars();

    let first = builder.build(&vars).unwrap();
    let second = builder.build(&vars).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.edges(), second.edges());
}

#[test]
fn after_lists_and_explicit_edges_are_merged() {
    let graph = GraphBuilder::new()
        .task(TaskSpec::shell("A", "true"))
        .task(TaskSpec::shell("B", "true").after("A"))
        .precedes("A", "B")
        .build(&VariableStore::new())
        .unwrap();

    assert_eq!(graph.edges(), vec![("A".to_string(), "B".to_string())]);
}

#[test]
fn cycle_is_rejected_with_the_cycle_path() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("A", "true"))
        .task(TaskSpec::shell("B", "true").after("A"))
        .task(TaskSpec::shell("C", "true").after("B"))
        .precedes("C", "A")
        .build(&VariableStore::new());

    match result {
        Err(PipelineError::CycleDetected { cycle }) => {
            assert_eq!(cycle.first(), cycle.last());
            let members: BTreeSet<&str> = cycle.iter().map(String::as_str).collect();
            assert_eq!(members, ["A", "B", "C"].into_iter().collect());
        }
        other => panic!("Expected CycleDetected, got: {:?}", other),
    }
}

#[test]
fn cycle_off_the_root_path_is_found() {
    // Root R is fine; X <-> Y form a cycle hanging off it.
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("R", "true"))
        .task(TaskSpec::shell("X", "true").after("R").after("Y"))
        .task(TaskSpec::shell("Y", "true").after("X"))
        .build(&VariableStore::new());

    match result {
        Err(PipelineError::CycleDetected { cycle }) => {
            assert!(cycle.contains(&"X".to_string()));
            assert!(cycle.contains(&"Y".to_string()));
            assert!(!cycle.contains(&"R".to_string()));
        }
        other => panic!("Expected CycleDetected, got: {:?}", other),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("A", "true").after("A"))
        .build(&VariableStore::new());

    match result {
        Err(PipelineError::CycleDetected { cycle }) => {
            assert_eq!(cycle, vec!["A".to_string(), "A".to_string()]);
        }
        other => panic!("Expected CycleDetected, got: {:?}", other),
    }
}

#[test]
fn duplicate_ids_are_rejected() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("A", "echo one"))
        .task(TaskSpec::shell("A", "echo two"))
        .build(&VariableStore::new());

    assert!(matches!(result, Err(PipelineError::DuplicateTask(ref id)) if id == "A"));
}

#[test]
fn dangling_predecessor_is_rejected() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("Deploy", "true").after("Build"))
        .build(&VariableStore::new());

    match result {
        Err(PipelineError::DanglingReference { task, missing }) => {
            assert_eq!(task, "Deploy");
            assert_eq!(missing, "Build");
        }
        other => panic!("Expected DanglingReference, got: {:?}", other),
    }
}

#[test]
fn dangling_successor_in_explicit_edge_is_rejected() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("A", "true"))
        .precedes("A", "Ghost")
        .build(&VariableStore::new());

    assert!(matches!(
        result,
        Err(PipelineError::DanglingReference { ref task, ref missing }) if task == "A" && missing == "Ghost"
    ));
}

#[test]
fn unresolved_placeholder_fails_the_build() {
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("Fetch", "wget -O {{var.missing}}/data.zip"))
        .build(&VariableStore::new().with("path_workflow", "/tmp/wf"));

    match result {
        Err(PipelineError::UnresolvedVariable { task, variable }) => {
            assert_eq!(task, "Fetch");
            assert_eq!(variable, "missing");
        }
        other => panic!("Expected UnresolvedVariable, got: {:?}", other),
    }
}

#[test]
fn placeholders_are_resolved_in_commands_and_kwargs() {
    let vars = VariableStore::new().with("path_workflow", "/tmp/wf");
    let graph = GraphBuilder::new()
        .task(TaskSpec::shell("Prepare", "mkdir -p {{var.value.path_workflow}}"))
        .task(
            TaskSpec::callable("Cleanup", "remove_dir", [("path", "{{ var.path_workflow }}/services")])
                .after("Prepare"),
        )
        .build(&vars)
        .unwrap();

    assert_eq!(
        graph.task("Prepare").map(|t| &t.action),
        Some(&TaskAction::shell("mkdir -p /tmp/wf"))
    );
    assert_eq!(
        graph.task("Cleanup").map(|t| &t.action),
        Some(&TaskAction::callable("remove_dir", [("path", "/tmp/wf/services")]))
    );
}

#[test]
fn structural_errors_are_reported_before_variable_errors() {
    // Both a cycle and an unresolved variable: the cycle wins.
    let result = GraphBuilder::new()
        .task(TaskSpec::shell("A", "echo {{var.nope}}").after("B"))
        .task(TaskSpec::shell("B", "true").after("A"))
        .build(&VariableStore::new());

    assert!(matches!(result, Err(PipelineError::CycleDetected { .. })));
}
