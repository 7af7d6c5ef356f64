// tests/variables.rs

use forecast_dag::errors::PipelineError;
use forecast_dag::vars::VariableStore;

fn store() -> VariableStore {
    VariableStore::new()
        .with("path_workflow", "/tmp/wf")
        .with("models_dir", "/models")
}

#[test]
fn renders_both_placeholder_spellings() {
    let vars = store();

    assert_eq!(
        vars.render("cp {{var.value.path_workflow}}/a {{ var.models_dir }}/a"),
        Ok("cp /tmp/wf/a /models/a".to_string())
    );
}

#[test]
fn text_without_placeholders_is_unchanged() {
    let vars = store();

    assert_eq!(vars.render("echo {{ not a var }} {var.x}"), Ok("echo {{ not a var }} {var.x}".to_string()));
}

#[test]
fn first_missing_name_is_reported() {
    let vars = store();

    assert_eq!(
        vars.render("{{var.path_workflow}}/{{var.first}}/{{var.second}}"),
        Err("first".to_string())
    );
}

#[test]
fn env_names_are_stripped_and_lowercased() {
    let mut vars = VariableStore::new();
    vars.merge_env([
        ("FORECAST_DAG_VAR_MODELS_DIR".to_string(), "/env/models".to_string()),
        ("FORECAST_DAG_VAR_".to_string(), "ignored".to_string()),
        ("HOME".to_string(), "/root".to_string()),
    ]);

    assert_eq!(vars.len(), 1);
    assert_eq!(vars.get("models_dir"), Some("/env/models"));
}

#[test]
fn assignments_override_earlier_values() {
    let mut vars = store();
    vars.merge_assignments(["models_dir=/cli/models", "extra="]).unwrap();

    assert_eq!(vars.get("models_dir"), Some("/cli/models"));
    assert_eq!(vars.get("extra"), Some(""));
}

#[test]
fn assignment_without_name_is_rejected() {
    let mut vars = VariableStore::new();

    let err = vars.merge_assignments(["=value"]).unwrap_err();

    assert!(matches!(err, PipelineError::ConfigError(_)));
    assert!(vars.is_empty());
}

#[test]
fn require_reports_the_missing_variable() {
    let vars = store();
    let required = vec!["path_workflow".to_string(), "api_token".to_string()];

    match vars.require(required.iter()) {
        Err(PipelineError::MissingVariable(name)) => assert_eq!(name, "api_token"),
        other => panic!("Expected MissingVariable, got: {:?}", other),
    }
}

#[test]
fn leading_tilde_expands_to_home() {
    let mut vars = VariableStore::new()
        .with("models_dir", "~/.models")
        .with("home", "~")
        .with("literal", "/srv/~/x")
        .with("other_user", "~bob/data");

    vars.expand_home("/home/forecast/");

    assert_eq!(vars.get("models_dir"), Some("/home/forecast/.models"));
    assert_eq!(vars.get("home"), Some("/home/forecast"));
    assert_eq!(vars.get("literal"), Some("/srv/~/x"));
    assert_eq!(vars.get("other_user"), Some("~bob/data"));
}
