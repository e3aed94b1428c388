//! Metrics command implementation.
//!
//! Evaluates the seven balance-sheet metrics on weekly-resampled series.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use reservoir_analytics::config::EngineConfig;
use reservoir_analytics::metrics::{BalanceSheetDashboard, BalanceSheetInputs};
use reservoir_core::Frequency;

use crate::cli::OutputFormat;
use crate::commands::DataArgs;
use crate::data::DataSet;
use crate::error::CliResult;
use crate::output::{print_header, print_json, print_output};

/// Arguments for the metrics command.
#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

/// One metric line.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl MetricRow {
    fn new(metric: &str, value: String, status: String) -> Self {
        Self {
            metric: metric.to_string(),
            value,
            status,
        }
    }

    fn insufficient(metric: &str) -> Self {
        Self::new(metric, "n/a".to_string(), "insufficient data".to_string())
    }
}

/// Builds the dashboard inputs, resampling every series to weekly buckets.
///
/// The H.4.1 items are weekly while reverse repo is daily; a common weekly
/// calendar lets the multi-series metrics align.
pub fn balance_sheet_inputs(data: &DataSet) -> CliResult<BalanceSheetInputs> {
    let weekly = |keys: &[&str]| -> CliResult<Option<_>> {
        for key in keys {
            if let Some(series) = data.resampled(key, Frequency::Weekly)? {
                return Ok(Some(series));
            }
        }
        Ok(None)
    };

    Ok(BalanceSheetInputs {
        frequency: Frequency::Weekly,
        fed_assets: weekly(&["fed_assets", "fed_soma_assets"])?,
        reserves: weekly(&["reserve_balances", "fed_reserves"])?,
        reverse_repo: weekly(&["reverse_repo", "reverse_repo_rrp"])?,
        tga: weekly(&["tga_balance", "treasury_general_acct"])?,
        fed_lending: weekly(&["fed_lending", "fed_lending_total"])?,
    })
}

/// Table rows summarizing a dashboard.
pub fn dashboard_rows(dashboard: &BalanceSheetDashboard) -> Vec<MetricRow> {
    let mut rows = Vec::with_capacity(7);

    rows.push(match dashboard.qt_pace.level() {
        Some(r) => MetricRow::new(
            "QT Pace (1M)",
            format!("{:+.2}% ({:+.1} bn)", r.pace_pct, r.change),
            r.phase.to_string(),
        ),
        None => MetricRow::insufficient("QT Pace (1M)"),
    });

    rows.push(match dashboard.reserve_regime.level() {
        Some(r) => MetricRow::new(
            "Reserve Regime",
            format!("{:.0} bn (effective {:.0})", r.reserves, r.effective_reserves),
            r.regime.to_string(),
        ),
        None => MetricRow::insufficient("Reserve Regime"),
    });

    rows.push(match dashboard.identity.level() {
        Some(r) => MetricRow::new(
            "Balance Sheet Identity",
            format!("residual {:+.1} bn ({:.1}%)", r.residual, r.relative_residual * 100.0),
            if r.balanced { "Balanced" } else { "Unbalanced" }.to_string(),
        ),
        None => MetricRow::insufficient("Balance Sheet Identity"),
    });

    rows.push(match dashboard.money_market.level() {
        Some(r) => MetricRow::new(
            "Money Market Stress",
            format!("score {:.1} (RRP {:.0} bn)", r.score, r.rrp_level),
            r.level.to_string(),
        ),
        None => MetricRow::insufficient("Money Market Stress"),
    });

    rows.push(match dashboard.lending_stress.level() {
        Some(r) => MetricRow::new(
            "Fed Lending Stress",
            format!("{:.1} pctile ({:.1} bn)", r.percentile, r.lending_level),
            if r.surge {
                format!("{} (surge)", r.level)
            } else {
                r.level.to_string()
            },
        ),
        None => MetricRow::insufficient("Fed Lending Stress"),
    });

    rows.push(match dashboard.tga_drag.level() {
        Some(r) => MetricRow::new(
            "TGA Drag",
            format!("{:.1}% (effective reserves {:.0})", r.ratio * 100.0, r.effective_reserves),
            r.regime.to_string(),
        ),
        None => MetricRow::insufficient("TGA Drag"),
    });

    rows.push(match dashboard.demand_proxy.level() {
        Some(r) => MetricRow::new(
            "Reserve Demand Proxy",
            format!("{:.1}% RRP share", r.ratio * 100.0),
            if r.crisis_indicator {
                format!("{} (crisis)", r.level)
            } else {
                r.level.to_string()
            },
        ),
        None => MetricRow::insufficient("Reserve Demand Proxy"),
    });

    rows
}

/// Execute the metrics command.
pub fn execute(args: MetricsArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let data = args.data.load()?;
    let inputs = balance_sheet_inputs(&data)?;
    let dashboard = BalanceSheetDashboard::evaluate(&inputs, config)?;

    match format {
        OutputFormat::Json => print_json(&dashboard),
        OutputFormat::Table => {
            let as_of = dashboard
                .as_of
                .map_or_else(|| "no data".to_string(), |d| d.to_string());
            print_header(&format!("Balance Sheet Metrics as of {as_of}"));
            print_output(&dashboard_rows(&dashboard), format)
        }
        OutputFormat::Csv | OutputFormat::Minimal => {
            print_output(&dashboard_rows(&dashboard), format)
        }
    }
}
