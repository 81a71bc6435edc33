//! driftwatch - host drift detection.
//!
//! Loads the config named on the command line, loads (or starts) the
//! baseline, then checks the host once right away and again every
//! `check_interval_secs` until interrupted.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, USAGE};
use driftwatch_config::MonitorConfig;
use driftwatch_engine::{MonitorContext, PromptApproval, Reconciler, Scheduler};
use driftwatch_enumerate::{Enumerator, system_enumerator};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config_path) = cli.config else {
        println!("{USAGE}");
        return ExitCode::from(1);
    };

    logging::init();

    match run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(config_path: &Path) -> Result<()> {
    let config = MonitorConfig::load(config_path)?;
    let interval = config.check_interval();
    let enumerator: Arc<dyn Enumerator> = Arc::from(system_enumerator(config.command_timeout()));

    let ctx = MonitorContext::load(config)
        .await
        .context("unable to load baseline")?;

    info!("driftwatch has started");
    info!(
        "Monitoring {} folder(s), {} port(s), {} process name(s)",
        ctx.config().monitor_folder.len(),
        ctx.config().ports_to_monitor.len(),
        ctx.config().process_to_monitor.len()
    );
    ctx.log_summary();

    let reconciler = Reconciler::new(ctx, enumerator, Box::new(PromptApproval::stdio()));
    let scheduler = Scheduler::new(reconciler, interval);
    scheduler.run_until(shutdown_signal()).await;
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Interrupted, stopping");
}
