//! Reservoir CLI - Command-line interface for systemic liquidity analytics.
//!
//! Series are read from CSV files named after indicator keys
//! (`reserve_balances.csv`, `vix.csv`, ...) inside a data directory.
//!
//! # Usage
//!
//! ```bash
//! # Transform one series
//! reservoir transform data/m2.csv --kind yoy --frequency monthly
//!
//! # Balance-sheet metrics
//! reservoir metrics --data-dir data
//!
//! # Regime classification and alerts
//! reservoir regime --data-dir data
//! reservoir alerts --data-dir data --as-of 2024-06-28
//!
//! # Everything at once, with custom thresholds
//! reservoir --config reservoir.yaml report --data-dir data --format json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod data;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; library `log` records are bridged into tracing
    let default_filter = if cli.verbose {
        "reservoir=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Transform(args) => commands::transform::execute(args, format)?,
        Commands::Metrics(args) => commands::metrics::execute(args, &config, format)?,
        Commands::Regime(args) => commands::regime::execute(args, &config, format)?,
        Commands::Alerts(args) => commands::alerts::execute(args, &config, format)?,
        Commands::Report(args) => commands::report::execute(args, &config, format)?,
        Commands::Config(args) => commands::config::execute(args, &config, format)?,
    }

    Ok(())
}
