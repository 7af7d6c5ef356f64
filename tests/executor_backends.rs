// tests/executor_backends.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::bail;
use tempfile::tempdir;

use forecast_dag::dag::{GraphBuilder, Kwargs, TaskRunState, TaskSpec};
use forecast_dag::engine::TaskOutcome;
use forecast_dag::errors::PipelineError;
use forecast_dag::exec::callable::run_callable;
use forecast_dag::exec::CallableRegistry;
use forecast_dag::types::PipelineStatus;
use forecast_dag::vars::VariableStore;

type TestResult = Result<(), Box<dyn Error>>;

fn kwargs(pairs: &[(&str, &str)]) -> Kwargs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(unix)]
mod shell {
    use super::*;
    use forecast_dag::exec::shell::run_shell;

    #[tokio::test]
    async fn successful_command_captures_stdout() -> TestResult {
        init_tracing();

        let (outcome, output) = run_shell("Echo", 1, "echo hello && echo world").await?;

        assert_eq!(outcome, TaskOutcome::Success);
        assert_eq!(output.stdout, "hello\nworld\n");
        assert!(output.stderr.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failing_command_reports_stderr_as_detail() -> TestResult {
        let (outcome, output) = run_shell("Fail", 1, "echo 'no such file' >&2; exit 3").await?;

        assert_eq!(outcome, TaskOutcome::failed("no such file"));
        assert_eq!(output.stderr, "no such file\n");
        Ok(())
    }

    #[tokio::test]
    async fn silent_failure_reports_exit_code() -> TestResult {
        let (outcome, _) = run_shell("Fail", 1, "exit 7").await?;

        assert_eq!(outcome, TaskOutcome::failed("process exited with code 7"));
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_output_does_not_break_a_successful_command() -> TestResult {
        let (outcome, output) =
            run_shell("Binary", 1, r"printf '\377\n'; seq 1 200000; echo done").await?;

        assert_eq!(outcome, TaskOutcome::Success);
        assert!(output.stdout.starts_with("\u{FFFD}\n1\n"));
        assert!(output.stdout.ends_with("200000\ndone\n"));
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_stderr_is_kept_as_failure_detail() -> TestResult {
        let (outcome, output) = run_shell("Binary", 1, r"printf 'bad \377 byte\n' >&2; exit 3").await?;

        assert_eq!(outcome, TaskOutcome::failed("bad \u{FFFD} byte"));
        assert_eq!(output.stderr, "bad \u{FFFD} byte\n");
        Ok(())
    }

    #[tokio::test]
    async fn independent_roots_run_concurrently() -> TestResult {
        init_tracing();

        let dir = tempdir()?;
        let vars = VariableStore::new().with("dir", dir.path().display().to_string());

        // Each task announces itself, then waits for the other one. Run one
        // after the other, the first would give up and fail.
        let rendezvous = |me: &str, other: &str| {
            format!(
                "touch {{{{var.dir}}}}/{me}; i=0; \
                 while [ ! -e {{{{var.dir}}}}/{other} ]; do \
                 i=$((i+1)); [ $i -gt 60 ] && exit 1; sleep 0.05; done"
            )
        };

        let graph = GraphBuilder::new()
            .task(TaskSpec::shell("FetchHumidity", rendezvous("humidity", "temperature")))
            .task(TaskSpec::shell("FetchTemperature", rendezvous("temperature", "humidity")))
            .task(TaskSpec::shell("Merge", "true").after("FetchHumidity").after("FetchTemperature"))
            .build(&vars)?;

        let report = with_timeout(forecast_dag::execute(graph, CallableRegistry::with_builtins())).await?;

        assert_eq!(report.status, PipelineStatus::Succeeded, "{report}");
        assert_eq!(report.status_of("Merge"), Some(TaskRunState::Succeeded));
        Ok(())
    }

    #[tokio::test]
    async fn pipeline_of_real_commands_runs_to_completion() -> TestResult {
        init_tracing();

        let dir = tempdir()?;
        let vars = VariableStore::new().with("path_workflow", dir.path().join("wf").display().to_string());

        let graph = GraphBuilder::new()
            .task(TaskSpec::shell("Prepare", "mkdir -p {{var.path_workflow}}"))
            .task(TaskSpec::shell("Write", "echo data > {{var.path_workflow}}/data.txt").after("Prepare"))
            .task(TaskSpec::shell("Read", "cat {{var.path_workflow}}/data.txt").after("Write"))
            .task(
                TaskSpec::callable("Cleanup", "remove_dir", [("path", "{{var.path_workflow}}")])
                    .after("Read")
                    .finalizer(),
            )
            .build(&vars)?;

        let report = with_timeout(forecast_dag::execute(graph, CallableRegistry::with_builtins())).await?;

        assert_eq!(report.status, PipelineStatus::Succeeded);
        assert_eq!(report.task("Read").map(|t| t.stdout.as_str()), Some("data\n"));
        assert!(!dir.path().join("wf").exists());
        Ok(())
    }

    #[tokio::test]
    async fn failing_command_skips_dependents_in_real_run() -> TestResult {
        let dir = tempdir()?;
        let work = dir.path().join("work");
        std::fs::create_dir(&work)?;
        let vars = VariableStore::new().with("work", work.display().to_string());

        let graph = GraphBuilder::new()
            .task(TaskSpec::shell("Fetch", "echo 'download failed' >&2; exit 1"))
            .task(TaskSpec::shell("Process", "true").after("Fetch"))
            .task(
                TaskSpec::callable("Cleanup", "remove_dir", [("path", "{{var.work}}")])
                    .after("Process")
                    .finalizer(),
            )
            .build(&vars)?;

        let report = with_timeout(forecast_dag::execute(graph, CallableRegistry::with_builtins())).await?;

        assert_eq!(report.status, PipelineStatus::Failed);
        assert_eq!(report.status_of("Process"), Some(TaskRunState::Skipped));
        assert_eq!(report.status_of("Cleanup"), Some(TaskRunState::Succeeded));
        assert_eq!(
            report.task("Fetch").and_then(|t| t.detail.as_deref()),
            Some("download failed")
        );
        assert!(!work.exists());
        Ok(())
    }
}

#[tokio::test]
async fn callable_receives_its_kwargs() -> TestResult {
    let seen = Arc::new(std::sync::Mutex::new(Kwargs::new()));
    let sink = Arc::clone(&seen);

    let mut registry = CallableRegistry::new();
    registry.register("merge_datasets", move |kw: &Kwargs| {
        *sink.lock().unwrap() = kw.clone();
        Ok(())
    });

    let args = kwargs(&[("hum_file", "/tmp/h.csv"), ("temp_file", "/tmp/t.csv")]);
    let outcome = run_callable(&registry, "Merge", 1, "merge_datasets", &args).await;

    assert_eq!(outcome, TaskOutcome::Success);
    assert_eq!(*seen.lock().unwrap(), args);
    Ok(())
}

#[tokio::test]
async fn callable_error_becomes_failure_detail() {
    let mut registry = CallableRegistry::new();
    registry.register("train_arima", |_: &Kwargs| bail!("not enough samples"));

    let outcome = run_callable(&registry, "TrainA", 1, "train_arima", &Kwargs::new()).await;

    assert_eq!(outcome, TaskOutcome::failed("not enough samples"));
}

#[tokio::test]
async fn callable_panic_is_contained() {
    let mut registry = CallableRegistry::new();
    registry.register("explode", |_: &Kwargs| panic!("kaboom"));

    let outcome = run_callable(&registry, "Boom", 1, "explode", &Kwargs::new()).await;

    assert_eq!(outcome, TaskOutcome::failed("callable 'explode' panicked"));
}

#[tokio::test]
async fn unknown_callable_at_runtime_fails_the_task() {
    let registry = CallableRegistry::new();

    let outcome = run_callable(&registry, "T", 1, "nope", &Kwargs::new()).await;

    assert_eq!(outcome, TaskOutcome::failed("unknown callable 'nope'"));
}

#[tokio::test]
async fn builtin_dir_callables_create_and_remove() -> TestResult {
    let dir = tempdir()?;
    let target = dir.path().join("a").join("b");
    let path = target.display().to_string();
    let registry = CallableRegistry::with_builtins();

    let created = run_callable(&registry, "Make", 1, "create_dir", &kwargs(&[("path", path.as_str())])).await;
    assert_eq!(created, TaskOutcome::Success);
    assert!(target.is_dir());

    let removed = run_callable(&registry, "Clean", 1, "remove_dir", &kwargs(&[("path", path.as_str())])).await;
    assert_eq!(removed, TaskOutcome::Success);
    assert!(!target.exists());

    // Removing it a second time fails: the directory is gone.
    let again = run_callable(&registry, "Clean", 1, "remove_dir", &kwargs(&[("path", path.as_str())])).await;
    assert!(!again.is_success());
    Ok(())
}

#[tokio::test]
async fn builtin_without_path_kwarg_fails() {
    let registry = CallableRegistry::with_builtins();

    let outcome = run_callable(&registry, "Clean", 1, "remove_dir", &Kwargs::new()).await;

    assert_eq!(outcome, TaskOutcome::failed("missing keyword argument 'path'"));
}

#[test]
fn unknown_callable_is_rejected_before_the_run() {
    let graph = GraphBuilder::new()
        .task(TaskSpec::callable("TrainA", "train_arima", [("path", "/models")]))
        .build(&VariableStore::new())
        .unwrap();

    let err = CallableRegistry::with_builtins().ensure_known(&graph).unwrap_err();

    match err {
        PipelineError::UnknownCallable { task, function } => {
            assert_eq!(task, "TrainA");
            assert_eq!(function, "train_arima");
        }
        other => panic!("Expected UnknownCallable, got: {:?}", other),
    }
}

#[tokio::test]
async fn callable_runs_once_per_attempt() -> TestResult {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let mut registry = CallableRegistry::new();
    registry.register("flaky", move |_: &Kwargs| {
        if counter.fetch_add(1, Ordering::SeqCst) < 1 {
            bail!("transient");
        }
        Ok(())
    });

    let graph = GraphBuilder::new()
        .task(TaskSpec::callable("Flaky", "flaky", Kwargs::new()).retries(1))
        .build(&VariableStore::new())?;

    let report = with_timeout(forecast_dag::execute(graph, registry)).await?;

    assert!(report.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.task("Flaky").map(|t| t.attempts), Some(2));
    Ok(())
}
