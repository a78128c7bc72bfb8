mod cli;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use dotenv::dotenv;
use log_janitor::{AppConfig, Janitor};
use tracing::error;

fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match log_janitor::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        None | Some(Commands::Run) => run_cleanup(config),
        Some(Commands::Stats) => run_stats(config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_cleanup(config: AppConfig) -> anyhow::Result<()> {
    let janitor = Janitor::new(config);
    janitor
        .run(Local::now())
        .context("Log cleanup did not complete")?;
    Ok(())
}

fn run_stats(config: AppConfig) -> anyhow::Result<()> {
    let janitor = Janitor::new(config);
    let stats = janitor.stats().with_context(|| {
        format!(
            "Failed to get stats for {}",
            janitor.config().dir.display()
        )
    })?;
    stats.report("Current logs:", Local::now());
    Ok(())
}
