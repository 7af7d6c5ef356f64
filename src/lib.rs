// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;
pub mod vars;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, resolve_variables, ConfigFile};
use crate::dag::{DagGraph, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent};
use crate::exec::{CallableRegistry, RealExecutorBackend};
use crate::report::RunReport;
use crate::vars::VariableStore;

/// Everything that must hold before a single task runs: variables resolved,
/// graph validated, every callable known.
///
/// Any error here means nothing was executed.
pub fn prepare(
    cfg: &ConfigFile,
    vars: &VariableStore,
    registry: &CallableRegistry,
) -> errors::Result<DagGraph> {
    let graph = cfg.graph_builder().build(vars)?;
    registry.ensure_known(&graph)?;
    debug!(
        pipeline = %cfg.pipeline.name,
        tasks = graph.len(),
        roots = ?graph.roots(),
        "pipeline prepared"
    );
    Ok(graph)
}

/// Execute one run of `graph` with the real executor and return its report.
pub async fn execute(graph: DagGraph, registry: CallableRegistry) -> errors::Result<RunReport> {
    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(rt_tx, Arc::new(registry));

    let core = CoreRuntime::new(Scheduler::new(graph));
    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await
}

/// High-level entry point used by `main.rs`.
///
/// This wires together config loading, variable resolution, graph building,
/// and the runtime. Returns `None` for `--dry-run`.
pub async fn run(args: CliArgs, registry: CallableRegistry) -> Result<Option<RunReport>> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let vars = resolve_variables(&cfg, std::env::vars(), args.vars.iter().map(String::as_str))?;
    let graph = prepare(&cfg, &vars, &registry)?;

    if args.dry_run {
        print_dry_run(&cfg, &graph)?;
        return Ok(None);
    }

    info!(pipeline = %cfg.pipeline.name, tasks = graph.len(), "starting pipeline run");
    let report = execute(graph, registry).await?.with_pipeline(cfg.pipeline.name.clone());

    print!("{report}");
    if let Some(ref path) = args.report {
        report.write_json(path)?;
        info!(path = %path, "run report written");
    }

    Ok(Some(report))
}

/// Simple dry-run output: print tasks in execution order with their
/// resolved actions.
fn print_dry_run(cfg: &ConfigFile, graph: &DagGraph) -> errors::Result<()> {
    println!("{} dry-run", cfg.pipeline.name);
    if let Some(ref description) = cfg.pipeline.description {
        println!("  {description}");
    }
    println!();

    println!("tasks ({}):", graph.len());
    for name in graph.topological_order()? {
        let Some(task) = graph.task(&name) else {
            continue;
        };
        println!("  - {name}");
        println!("      {}", task.action);
        let deps = graph.dependencies_of(&name);
        if !deps.is_empty() {
            println!("      after: {deps:?}");
        }
        if task.join.is_finalizer() {
            println!("      join: {}", task.join);
        }
        if task.retries > 0 {
            println!("      retries: {}", task.retries);
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
