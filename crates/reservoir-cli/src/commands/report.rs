//! Report command implementation.
//!
//! Runs every analysis on one data directory and prints a combined report
//! headed by a one-line summary.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use reservoir_analytics::alerts::{Alert, AlertSummary, Signal, SignalSnapshot};
use reservoir_analytics::config::EngineConfig;
use reservoir_analytics::metrics::BalanceSheetDashboard;
use reservoir_analytics::regime::{MacroRegime, RegimeClassification};
use reservoir_core::indicators::IndicatorCatalog;
use reservoir_core::Classified;
use reservoir_math::prelude::{latest_snapshot, LatestValues};

use crate::cli::OutputFormat;
use crate::commands::{alerts, metrics, regime, DataArgs};
use crate::data::DataSet;
use crate::error::CliResult;
use crate::output::{format_pct, format_value, print_header, print_json, print_output};

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

/// Latest values of one indicator.
#[derive(Debug, Clone, Serialize, Tabled)]
struct IndicatorRow {
    #[tabled(rename = "Indicator")]
    indicator: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "YoY")]
    yoy: String,
    #[tabled(rename = "3M Ann.")]
    annualized_3m: String,
    #[tabled(rename = "Z (3Y)")]
    zscore_3y: String,
    #[tabled(rename = "Pctile (3Y)")]
    percentile_3y: String,
}

/// Everything the report prints.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Latest observation date across the data directory.
    pub as_of: Option<NaiveDate>,
    /// One-line summary.
    pub summary: String,
    /// Latest values per indicator key.
    pub indicators: BTreeMap<String, LatestValues>,
    /// Balance-sheet metrics.
    pub metrics: BalanceSheetDashboard,
    /// Regime classification.
    pub regime: RegimeClassification,
    /// Alert signals.
    pub signals: SignalSnapshot,
    /// Fired alerts.
    pub alerts: Vec<Alert>,
    /// Alert counts by severity.
    pub alert_summary: AlertSummary,
}

/// Composes the one-line summary from the regime and a few headline readings.
///
/// `credit_growth` is the 3M annualized bank credit growth in percent and
/// `volatility_percentile` is on the 0-100 scale.
pub fn daily_summary(
    regime: &Classified<MacroRegime>,
    credit_growth: Option<f64>,
    spread_zscore: Option<f64>,
    volatility_percentile: Option<f64>,
) -> String {
    let mut parts = vec![match regime {
        Classified::Level(MacroRegime::Expansion) => "Balance sheets are expanding".to_string(),
        Classified::Level(MacroRegime::LateCycle) => {
            "Balance sheets are still expanding but beliefs are running ahead of fundamentals"
                .to_string()
        }
        Classified::Level(MacroRegime::Contraction) => {
            "Balance-sheet contraction pressure is building".to_string()
        }
        Classified::Level(MacroRegime::Stress) => {
            "Collateral impairment puts balance sheets at risk of sharp contraction".to_string()
        }
        Classified::InsufficientData => "Not enough data to classify the regime".to_string(),
    }];

    if let Some(growth) = credit_growth {
        parts.push(if growth > 5.0 {
            format!("credit creation is strong ({growth:.1}% annualized)")
        } else if growth > 0.0 {
            format!("credit growth is moderate ({growth:.1}% annualized)")
        } else {
            format!("credit is contracting ({growth:.1}% annualized)")
        });
    }

    let mut risk = Vec::new();
    match spread_zscore {
        Some(z) if z > 1.5 => risk.push("spreads widening"),
        Some(z) if z < -1.0 => risk.push("spreads compressed"),
        _ => {}
    }
    match volatility_percentile {
        Some(p) if p > 80.0 => risk.push("volatility elevated"),
        Some(p) if p < 20.0 => risk.push("volatility calm"),
        _ => {}
    }
    if !risk.is_empty() {
        parts.push(format!("risk premia show {}", risk.join(" and ")));
    }

    parts.join(", ") + "."
}

fn indicator_snapshots(data: &DataSet) -> CliResult<BTreeMap<String, LatestValues>> {
    let mut snapshots = BTreeMap::new();
    for key in data.keys() {
        if let Some(series) = data.get(key) {
            snapshots.insert(key.to_string(), latest_snapshot(series, data.frequency(key))?);
        }
    }
    Ok(snapshots)
}

/// Builds the full report.
pub fn build_report(data: &DataSet, config: &EngineConfig) -> CliResult<Report> {
    let indicators = indicator_snapshots(data)?;
    let dashboard =
        BalanceSheetDashboard::evaluate(&metrics::balance_sheet_inputs(data)?, config)?;
    let classification = regime::classify(data, config)?;
    let run = alerts::run(data, config)?;

    let spread_zscore = ["hy_spread", "ig_spread"]
        .iter()
        .find_map(|key| indicators.get(*key))
        .and_then(|s| s.zscore_3y);
    let summary = daily_summary(
        &classification.primary,
        run.signals.get(Signal::CreditGrowthAnnualizedPct),
        spread_zscore,
        run.signals.get(Signal::VolatilityPercentile),
    );

    Ok(Report {
        as_of: data.latest_date(),
        summary,
        indicators,
        metrics: dashboard,
        regime: classification,
        signals: run.signals,
        alerts: run.alerts,
        alert_summary: run.summary,
    })
}

fn indicator_rows(indicators: &BTreeMap<String, LatestValues>) -> Vec<IndicatorRow> {
    let catalog = IndicatorCatalog::all();
    indicators
        .iter()
        .map(|(key, s)| IndicatorRow {
            indicator: catalog
                .get(key)
                .map_or_else(|| key.clone(), |c| c.name.clone()),
            date: s.date.map_or_else(|| "-".to_string(), |d| d.to_string()),
            latest: format_value(s.latest, 2),
            yoy: format_pct(s.yoy.map(|v| v * 100.0)),
            annualized_3m: format_pct(s.annualized_3m.map(|v| v * 100.0)),
            zscore_3y: format_value(s.zscore_3y, 2),
            percentile_3y: format_value(s.percentile_3y, 1),
        })
        .collect()
}

/// Execute the report command.
pub fn execute(args: ReportArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let data = args.data.load()?;
    let report = build_report(&data, config)?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            let as_of = report
                .as_of
                .map_or_else(|| "no data".to_string(), |d| d.to_string());
            print_header(&format!("Reservoir Report as of {as_of}"));
            println!("{}", report.summary);

            print_header("Indicators");
            print_output(&indicator_rows(&report.indicators), format)?;

            print_header("Balance Sheet Metrics");
            print_output(&metrics::dashboard_rows(&report.metrics), format)?;

            regime::print_classification(&report.regime)?;

            print_header("Alerts");
            alerts::print_alerts(&report.alerts);
            Ok(())
        }
        OutputFormat::Csv => print_output(&indicator_rows(&report.indicators), format),
        OutputFormat::Minimal => {
            println!("{}", report.summary);
            Ok(())
        }
    }
}
