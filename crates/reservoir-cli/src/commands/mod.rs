//! CLI command implementations.

pub mod alerts;
pub mod config;
pub mod metrics;
pub mod regime;
pub mod report;
pub mod transform;

// Re-export submodules for convenience
pub use alerts::AlertsArgs;
pub use config::ConfigArgs;
pub use metrics::MetricsArgs;
pub use regime::RegimeArgs;
pub use report::ReportArgs;
pub use transform::TransformArgs;

use chrono::NaiveDate;
use clap::Args;
use std::path::{Path, PathBuf};

use reservoir_analytics::config::EngineConfig;
use reservoir_analytics::error::Validate;
use reservoir_core::Frequency;

use crate::data::{parse_date, parse_frequency_override, DataSet};
use crate::error::{CliError, CliResult};

/// Series inputs shared by the analysis commands.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Directory of `<indicator_key>.csv` files
    #[arg(short, long, env = "RESERVOIR_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Evaluate as of this date (YYYY-MM-DD), ignoring later observations
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Frequency override for a series, e.g. `earnings=monthly` (repeatable)
    #[arg(long = "freq", value_name = "KEY=FREQUENCY", value_parser = parse_frequency_override)]
    pub frequencies: Vec<(String, Frequency)>,
}

impl DataArgs {
    /// Loads the data directory, truncated to `--as-of` if given.
    pub fn load(&self) -> CliResult<DataSet> {
        let data = DataSet::load_dir(&self.data_dir, &self.frequencies)?;
        if data.is_empty() {
            crate::output::print_warning(&format!(
                "No CSV files found in {}",
                self.data_dir.display()
            ));
        }
        Ok(match self.as_of {
            Some(date) => data.truncate_to(date),
            None => data,
        })
    }
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

/// Loads and validates the engine configuration; defaults if no file is given.
pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = read_config(path)?;
    config.validate_or_error()?;
    tracing::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

/// Parses a configuration file by extension, without validating it.
pub fn read_config(path: &Path) -> CliResult<EngineConfig> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;
    match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| CliError::Config(e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| CliError::Config(e.to_string()))
        }
        _ => Err(CliError::UnsupportedConfigFormat(path.to_path_buf())),
    }
}
