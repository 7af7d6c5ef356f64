// src/exec/shell.rs

//! Shell executor: runs a command line through the platform shell.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::{TaskOutcome, TaskOutput};

/// Run `command` to completion, capturing stdout and stderr.
///
/// Exit code 0 is a success. Any other exit is a failure whose detail is the
/// captured stderr, or the exit status when stderr is empty. An `Err` means
/// the process could not be spawned or waited on at all.
///
/// The child is spawned with `kill_on_drop(true)`, so dropping this future
/// never leaves an orphaned process behind.
pub async fn run_shell(task: &str, run_id: u64, command: &str) -> Result<(TaskOutcome, TaskOutput)> {
    info!(task = %task, run_id, cmd = %command, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    // Drain both pipes concurrently so neither buffer can fill and stall
    // the child.
    let stdout_reader = child
        .stdout
        .take()
        .map(|out| tokio::spawn(collect_lines(out, task.to_string(), "stdout")));
    let stderr_reader = child
        .stderr
        .take()
        .map(|err| tokio::spawn(collect_lines(err, task.to_string(), "stderr")));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    let output = TaskOutput {
        stdout: join_reader(stdout_reader).await,
        stderr: join_reader(stderr_reader).await,
    };

    info!(
        task = %task,
        run_id,
        exit_code = status.code(),
        success = status.success(),
        "task process exited"
    );

    let outcome = if status.success() {
        TaskOutcome::Success
    } else {
        let stderr = output.stderr.trim();
        let detail = if stderr.is_empty() {
            match status.code() {
                Some(code) => format!("process exited with code {code}"),
                None => "process terminated by signal".to_string(),
            }
        } else {
            stderr.to_string()
        };
        TaskOutcome::failed(detail)
    };

    Ok((outcome, output))
}

/// Drain `reader` to EOF, logging each line at debug level.
///
/// Bytes are kept as-is and decoded lossily at the end, so non-UTF-8 output
/// never stops the drain (which would close the pipe under the child).
async fn collect_lines<R>(reader: R, task: String, stream: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut collected: Vec<u8> = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                debug!(task = %task, "{stream}: {}", text.trim_end_matches(['\r', '\n']));
                collected.extend_from_slice(&line);
            }
            Err(err) => {
                debug!(task = %task, error = %err, "{stream}: read failed; output truncated");
                break;
            }
        }
    }

    String::from_utf8_lossy(&collected).into_owned()
}

async fn join_reader(reader: Option<tokio::task::JoinHandle<String>>) -> String {
    match reader {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}
