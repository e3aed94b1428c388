//! Config command implementation.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use reservoir_analytics::config::EngineConfig;
use reservoir_analytics::error::Validate;

use crate::cli::OutputFormat;
use crate::commands::read_config;
use crate::error::CliError;
use crate::output::{print_info, print_json, print_output, print_success, severity_label};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (YAML unless --format json)
    Show,

    /// Check a configuration file and report every problem found
    Validate {
        /// Configuration file (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// List the configured alert rules
    Rules,
}

/// One alert rule.
#[derive(Debug, Clone, Serialize, Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Escalates To")]
    escalation: String,
    #[tabled(rename = "Signals")]
    signals: String,
}

fn rule_rows(config: &EngineConfig, colored: bool) -> Vec<RuleRow> {
    let label = |severity| {
        if colored {
            severity_label(severity)
        } else {
            severity.to_string()
        }
    };
    config
        .alert_rules
        .iter()
        .map(|rule| RuleRow {
            id: rule.id.clone(),
            severity: label(rule.severity),
            escalation: rule
                .escalation
                .as_ref()
                .map_or_else(|| "-".to_string(), |e| label(e.severity)),
            signals: rule
                .signals()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Json => print_json(config),
            _ => {
                let yaml =
                    serde_yaml::to_string(config).map_err(|e| CliError::Config(e.to_string()))?;
                print!("{yaml}");
                Ok(())
            }
        },
        ConfigCommand::Validate { file } => {
            let candidate = read_config(&file)?;
            let errors = candidate.validate();
            if errors.is_empty() {
                print_success(&format!("{} is valid", file.display()));
                print_info(&format!("{} alert rules", candidate.alert_rules.len()));
                return Ok(());
            }
            for error in &errors {
                eprintln!("  - {error}");
            }
            bail!("{} has {} validation error(s)", file.display(), errors.len());
        }
        ConfigCommand::Rules => match format {
            OutputFormat::Json => print_json(&config.alert_rules),
            OutputFormat::Table => print_output(&rule_rows(config, true), format),
            OutputFormat::Csv | OutputFormat::Minimal => {
                print_output(&rule_rows(config, false), format)
            }
        },
    }
}
