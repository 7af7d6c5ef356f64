// tests/run_report.rs

mod common;
use crate::common::builders::forecast_graph;

use std::error::Error;

use serde_json::Value;
use tempfile::tempdir;

use forecast_dag::dag::Scheduler;
use forecast_dag::engine::TaskOutcome;

type TestResult = Result<(), Box<dyn Error>>;

fn failed_run() -> Scheduler {
    let mut scheduler = Scheduler::new(forecast_graph());
    scheduler.start_new_run();
    scheduler.handle_completion("Prepare", TaskOutcome::Success);
    scheduler.handle_completion("FetchHumidity", TaskOutcome::failed("HTTP 404"));
    scheduler.handle_completion("FetchTemperature", TaskOutcome::Success);
    scheduler.handle_completion("Cleanup", TaskOutcome::Success);
    scheduler
}

#[test]
fn json_report_carries_statuses_and_details() -> TestResult {
    let report = failed_run().report().with_pipeline("ccsa-forecast");

    let json: Value = serde_json::from_str(&report.to_json()?)?;

    assert_eq!(json["pipeline"], "ccsa-forecast");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["failed"], serde_json::json!(["FetchHumidity"]));
    assert_eq!(json["skipped"].as_array().map(Vec::len), Some(8));

    let tasks = json["tasks"].as_array().ok_or("tasks is not an array")?;
    let fetch = tasks
        .iter()
        .find(|t| t["id"] == "FetchHumidity")
        .ok_or("FetchHumidity missing")?;
    assert_eq!(fetch["status"], "failed");
    assert_eq!(fetch["detail"], "HTTP 404");

    let merge = tasks.iter().find(|t| t["id"] == "Merge").ok_or("Merge missing")?;
    assert_eq!(merge["status"], "skipped");
    assert_eq!(merge["attempts"], 0);
    assert!(merge.get("detail").is_none());
    Ok(())
}

#[test]
fn json_report_is_written_to_disk() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("report.json");

    failed_run().report().write_json(&path)?;

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(json["run_id"], 1);
    Ok(())
}

#[test]
fn text_report_lists_failures_and_skips() {
    let text = failed_run().report().with_pipeline("ccsa-forecast").to_string();

    assert!(text.starts_with("pipeline 'ccsa-forecast' run 1 failed"));
    assert!(text.contains("HTTP 404"));
    assert!(text.contains("failed: FetchHumidity"));
    assert!(text.contains("skipped: Merge"));
}

#[test]
fn task_states_render_in_snake_case() {
    use forecast_dag::dag::TaskRunState;

    assert_eq!(TaskRunState::NotInRun.to_string(), "not_in_run");
    assert_eq!(TaskRunState::Skipped.to_string(), "skipped");

    let text = failed_run().report().to_string();
    let merge_row = text
        .lines()
        .find(|l| l.trim_start().starts_with("Merge "))
        .expect("Merge row present");
    assert!(merge_row.contains("skipped"), "{merge_row}");
}
