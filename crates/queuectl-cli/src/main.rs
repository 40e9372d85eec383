//! # QueueCTL
//!
//! Main entry point: loads configuration, starts the prompt and stops every
//! worker before exiting.

use anyhow::Context;
use queuectl_cli::{logging, prompt, startup, Controller};
use queuectl_config::ConfigLoader;
use queuectl_jobs::register_metrics;
use std::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {:#}", e);
        eprintln!("queuectl: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_loader =
        ConfigLoader::from_default_location().context("failed to load configuration")?;
    let config = config_loader.config();

    logging::init(&config.logging).context("failed to initialise logging")?;
    register_metrics();
    startup::log_startup_info(config_loader.environment(), config);

    let mut controller = Controller::from_config(&config.jobs);
    println!("{}", startup::banner());

    let lines = prompt::spawn_line_reader(BufReader::new(std::io::stdin()))
        .context("failed to start input reader")?;
    let reason = prompt::run(
        &mut controller,
        lines,
        tokio::io::stdout(),
        prompt::shutdown_signal(),
    )
    .await
    .context("prompt failed")?;
    info!(?reason, "Prompt closed");

    if controller.running_workers() > 0 {
        println!("Stopping all worker threads...");
    }
    controller
        .shutdown()
        .await
        .context("failed to stop workers")?;
    println!("All workers stopped");

    Ok(())
}
