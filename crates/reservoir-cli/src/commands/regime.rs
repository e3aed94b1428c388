//! Regime command implementation.
//!
//! Builds factor scores from the data directory and classifies the regime.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use reservoir_analytics::config::EngineConfig;
use reservoir_analytics::regime::{
    FactorBuilder, FactorInputs, RegimeClassification, RegimeClassifier,
};

use crate::cli::OutputFormat;
use crate::commands::DataArgs;
use crate::data::DataSet;
use crate::error::CliResult;
use crate::output::{format_value, print_header, print_json, print_output, print_warning, KeyValue};

/// Arguments for the regime command.
#[derive(Args, Debug)]
pub struct RegimeArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

/// One factor's contribution.
#[derive(Debug, Clone, Serialize, Tabled)]
struct ContributionRow {
    #[tabled(rename = "Factor")]
    factor: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

/// Maps data-directory keys onto the classifier's factors.
pub fn factor_inputs(data: &DataSet) -> FactorInputs {
    FactorInputs {
        credit: data.input(&["bank_credit"]),
        spread: data.input(&["hy_spread", "ig_spread"]),
        volatility: data.input(&["vix"]),
        valuation: data.input(&["valuation", "pe_ratio"]),
        earnings: data.input(&["earnings"]),
        real_yield: data.input(&["real_yield_10y"]),
    }
}

/// Scores the factors and classifies the regime.
pub fn classify(data: &DataSet, config: &EngineConfig) -> CliResult<RegimeClassification> {
    let scores = FactorBuilder::new(config.factors.clone()).build(&factor_inputs(data))?;
    let classifier = RegimeClassifier::new(config.regime.clone())?;
    Ok(classifier.classify(&scores)?)
}

/// Headline rows for a classification.
pub fn summary_rows(result: &RegimeClassification) -> Vec<KeyValue> {
    let confidence = match result.confidence {
        Some(c) if result.low_confidence => format!("{:.2} (use with caution)", c),
        Some(c) => format!("{:.2}", c),
        None => "n/a".to_string(),
    };
    vec![
        KeyValue::new("Regime", result.primary.to_string()),
        KeyValue::new("Composite", format_value(result.composite, 1)),
        KeyValue::new("Confidence", confidence),
        KeyValue::new(
            "Volatility Veto",
            if result.volatility_veto { "yes" } else { "no" },
        ),
    ]
}

fn contribution_rows(result: &RegimeClassification) -> Vec<ContributionRow> {
    result
        .contributions
        .iter()
        .map(|c| ContributionRow {
            factor: c.factor.to_string(),
            score: format!("{:.1}", c.score),
            weight: format!("{:.3}", c.weight),
            contribution: format!("{:+.2}", c.contribution),
        })
        .collect()
}

/// Prints a classification as tables.
pub fn print_classification(result: &RegimeClassification) -> Result<()> {
    print_header("Macro Regime");
    print_output(&summary_rows(result), OutputFormat::Table)?;
    if !result.contributions.is_empty() {
        print_header("Factor Contributions");
        print_output(&contribution_rows(result), OutputFormat::Table)?;
    }
    print_header("Explanation");
    for line in &result.explanation {
        println!("  - {line}");
    }
    if let Some(warning) = &result.data_quality_warning {
        print_warning(warning);
    }
    Ok(())
}

/// Execute the regime command.
pub fn execute(args: RegimeArgs, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let data = args.data.load()?;
    let result = classify(&data, config)?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => print_classification(&result),
        OutputFormat::Csv => print_output(&contribution_rows(&result), format),
        OutputFormat::Minimal => {
            println!("{}", result.primary);
            Ok(())
        }
    }
}
