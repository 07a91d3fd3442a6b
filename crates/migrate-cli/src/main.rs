//! Migrate CLI - Main entry point

use clap::Parser;
use migrate_cli::{run, Cli, MigrationConfig, EXIT_ERROR};
use migrate_common::logging::{init_logging, LogConfig};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn, Level};

#[tokio::main]
async fn main() {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let log_config = LogConfig::console(level);

    // Environment variables take precedence over flags for logging
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The migration should still run without logging
    let _guard = init_logging(&log_config).ok();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current record");
            on_interrupt.cancel();
        }
    });

    let result = match MigrationConfig::from_env() {
        Ok(config) => run(&config.apply_cli(&cli), &cancel).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            println!("{}", summary.render());
            process::exit(summary.exit_code());
        },
        Err(e) => {
            error!(error = %e, "Migration failed");
            eprintln!("Error: {}", e);
            process::exit(EXIT_ERROR);
        },
    }
}
