//! # stockwise
//!
//! Command-line front end for the Stockwise inventory.
//!
//! ## Usage
//! ```bash
//! stockwise product add "Widget" --sale-price 150
//! stockwise purchase --product Widget --quantity 10 --total-cost 1000
//! stockwise sell --product widget --quantity 3 --customer Ana
//! stockwise report --year 2026 --month 3
//! stockwise export ./out
//! ```
//!
//! ## Log Levels
//! - Default: INFO, to stderr
//! - `RUST_LOG=stockwise_db=debug` - per-row database logging
//! - `--verbose` - DEBUG everywhere except sqlx

mod cli;
mod commands;
mod config;

use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stockwise_db::{Database, DbConfig};

use crate::cli::Cli;
use crate::commands::Printer;
use crate::config::{AppConfig, Overrides};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&Overrides {
        config_file: cli.config,
        database_path: cli.database,
    })?;
    debug!(database = %config.database_path().display(), "Configuration loaded");

    let db = Database::new(DbConfig::new(config.database_path())).await?;
    let inventory = db.inventory();
    let printer = Printer::new(config, cli.json);

    let result = commands::execute(cli.command, &inventory, &printer).await;
    db.close().await;

    let output = result?;
    if !output.is_empty() {
        println!("{}", output.trim_end());
    }
    Ok(())
}

/// Installs the stderr subscriber.
///
/// `RUST_LOG` wins unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,sqlx=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
