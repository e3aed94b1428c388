//! Alerts command implementation.
//!
//! Derives the alert signals from the data directory and runs the rule set.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use reservoir_analytics::alerts::{
    Alert, AlertEngine, AlertSummary, Severity, SignalBuilder, SignalInputs, SignalSnapshot,
};
use reservoir_analytics::config::EngineConfig;

use crate::cli::OutputFormat;
use crate::commands::DataArgs;
use crate::data::DataSet;
use crate::error::CliResult;
use crate::output::{
    format_value, print_header, print_json, print_output, print_success, severity_label, KeyValue,
};

/// Arguments for the alerts command.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only show alerts at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,
}

/// Severity filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SeverityArg {
    /// Informational and above
    Informational,
    /// Watch and above
    Watch,
    /// Action only
    Action,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Informational => Severity::Informational,
            SeverityArg::Watch => Severity::Watch,
            SeverityArg::Action => Severity::Action,
        }
    }
}

/// One fired alert.
#[derive(Debug, Clone, Serialize, Tabled)]
struct AlertRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Alerts of one run with the snapshot they were evaluated on.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRun {
    /// Signals the rules read.
    pub signals: SignalSnapshot,
    /// Fired alerts, in rule order.
    pub alerts: Vec<Alert>,
    /// Counts by severity.
    pub summary: AlertSummary,
}

/// Maps data-directory keys onto the alert signals.
pub fn signal_inputs(data: &DataSet) -> SignalInputs {
    SignalInputs {
        valuation: data.input(&["valuation", "pe_ratio"]),
        earnings: data.input(&["earnings"]),
        volatility: data.input(&["vix"]),
        spread: data.input(&["hy_spread", "ig_spread"]),
        equity: data.input(&["sp500"]),
        credit: data.input(&["bank_credit"]),
    }
}

/// Builds the signals and evaluates the configured rules.
pub fn run(data: &DataSet, config: &EngineConfig) -> CliResult<AlertRun> {
    let signals = SignalBuilder::new(config.signals.clone()).build(&signal_inputs(data))?;
    let engine = AlertEngine::new(config.alert_rules.clone())?
        .with_evaluation(config.evaluation.clone());
    let alerts = engine.evaluate(&signals);
    let summary = AlertSummary::from_alerts(&alerts);
    Ok(AlertRun {
        signals,
        alerts,
        summary,
    })
}

/// Signal values as display rows.
pub fn signal_rows(signals: &SignalSnapshot) -> Vec<KeyValue> {
    reservoir_analytics::alerts::Signal::ALL
        .iter()
        .map(|s| KeyValue::new(s.key(), format_value(signals.get(*s), 2)))
        .collect()
}

/// Prints alerts as colored one-line messages.
pub fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        print_success("No alerts fired.");
        return;
    }
    for alert in alerts {
        println!("{} {}", severity_label(alert.severity), alert.format_message());
    }
}

/// Execute the alerts command.
pub fn execute(args: AlertsArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let data = args.data.load()?;
    let mut run = run(&data, config)?;
    if let Some(min) = args.min_severity {
        let min = Severity::from(min);
        run.alerts.retain(|a| a.severity >= min);
        run.summary = AlertSummary::from_alerts(&run.alerts);
    }

    match format {
        OutputFormat::Json => print_json(&run),
        OutputFormat::Table => {
            print_header("Signals");
            print_output(&signal_rows(&run.signals), format)?;
            print_header("Alerts");
            print_alerts(&run.alerts);
            Ok(())
        }
        OutputFormat::Csv => {
            let rows: Vec<AlertRow> = run
                .alerts
                .iter()
                .map(|a| AlertRow {
                    severity: a.severity.to_string(),
                    rule: a.rule_id.clone(),
                    description: a.description.clone(),
                })
                .collect();
            print_output(&rows, format)
        }
        OutputFormat::Minimal => {
            for alert in &run.alerts {
                println!("{}", alert.rule_id);
            }
            Ok(())
        }
    }
}
