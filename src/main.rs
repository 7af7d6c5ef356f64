// src/main.rs

use forecast_dag::exec::CallableRegistry;
use forecast_dag::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("forecast-dag error: {err:?}");
            std::process::exit(2);
        }
    }
}

/// Returns whether the pipeline succeeded (a dry run always does).
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args, CallableRegistry::with_builtins()).await?;
    Ok(report.is_none_or(|r| r.is_success()))
}
