//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::{AlertsArgs, ConfigArgs, MetricsArgs, RegimeArgs, ReportArgs, TransformArgs};

/// Reservoir - Systemic liquidity analytics CLI
#[derive(Parser)]
#[command(name = "reservoir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (.json, .yaml or .yml)
    #[arg(short, long, global = true, env = "RESERVOIR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Apply a transform (YoY, z-score, percentile, ...) to one series
    Transform(TransformArgs),

    /// Evaluate the balance-sheet and liquidity stress metrics
    Metrics(MetricsArgs),

    /// Classify the macro regime from factor series
    Regime(RegimeArgs),

    /// Evaluate alert rules against derived signals
    Alerts(AlertsArgs),

    /// Full report: indicators, metrics, regime and alerts
    Report(ReportArgs),

    /// Show or validate engine configuration
    Config(ConfigArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the value)
    Minimal,
}
