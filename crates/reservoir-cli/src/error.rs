//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use reservoir_analytics::AnalyticsError;
use reservoir_core::ReservoirError;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid date format.
    #[error("Invalid date format: {0}. Use YYYY-MM-DD.")]
    InvalidDate(String),

    /// A CSV file could not be parsed.
    #[error("Failed to read {}: {source}", path.display())]
    Csv {
        /// Offending file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: csv::Error,
    },

    /// A requested column is not in the CSV header.
    #[error("Column '{column}' not found in {}", path.display())]
    MissingColumn {
        /// Offending file.
        path: PathBuf,
        /// Requested column.
        column: String,
    },

    /// A cell is neither a number nor a missing marker.
    #[error("Invalid value '{value}' in {} at line {line}", path.display())]
    InvalidValue {
        /// Offending file.
        path: PathBuf,
        /// One-based line number.
        line: u64,
        /// Cell content.
        value: String,
    },

    /// Configuration file extension is not recognized.
    #[error("Unsupported configuration format: {}. Use .json, .yaml or .yml.", .0.display())]
    UnsupportedConfigFormat(PathBuf),

    /// Configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Series contract violation.
    #[error(transparent)]
    Series(#[from] ReservoirError),

    /// Analytics error.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
