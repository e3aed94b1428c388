//! Transform command implementation.
//!
//! Applies one transform from the transform library to a single series.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use reservoir_core::{DatedSeries, Frequency};
use reservoir_math::prelude::*;

use crate::cli::OutputFormat;
use crate::data::read_series;
use crate::output::{format_value, print_header, print_json, print_output, KeyValue};

/// Arguments for the transform command.
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// CSV file holding the series
    pub input: PathBuf,

    /// Value column (defaults to the first non-date column)
    #[arg(long)]
    pub column: Option<String>,

    /// Transform to apply
    #[arg(short, long, value_enum, default_value = "yoy")]
    pub kind: TransformKind,

    /// Sampling frequency of the series
    #[arg(long, default_value = "daily")]
    pub frequency: Frequency,

    /// Resample to this frequency (last value per bucket) before transforming
    #[arg(long)]
    pub resample: Option<Frequency>,

    /// Rolling window length in years
    #[arg(long, default_value_t = 3)]
    pub window_years: usize,

    /// Lag in observations (defaults to the conventional lag for the transform)
    #[arg(long)]
    pub periods: Option<usize>,

    /// Centered window for inflection detection
    #[arg(long, default_value_t = 5)]
    pub lookback: usize,

    /// Minimum % move for an inflection to count
    #[arg(long, default_value_t = 0.0)]
    pub sensitivity: f64,

    /// Only print the last N rows
    #[arg(long)]
    pub tail: Option<usize>,
}

/// Available transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransformKind {
    /// Year-over-year change (%)
    Yoy,
    /// Three-month change annualized (%)
    Annualized3m,
    /// One-month change (%)
    Change1m,
    /// Absolute difference over `periods`
    Difference,
    /// Change of the one-month difference
    Acceleration,
    /// Rolling z-score
    Zscore,
    /// One-month change in the rolling z-score
    ZscoreChange,
    /// Rolling percentile rank (0-100)
    Percentile,
    /// Local peaks and troughs
    Inflection,
    /// Rolling mean, std, min, max, median, skew and kurtosis
    Stats,
    /// Latest value with its standard transforms
    Snapshot,
    /// The (optionally resampled) series itself
    Values,
}

/// One transformed observation.
#[derive(Debug, Clone, Serialize, Tabled)]
struct ValueRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// One row of rolling statistics.
#[derive(Debug, Clone, Serialize, Tabled)]
struct StatsRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "Skew")]
    skew: String,
    #[tabled(rename = "Kurtosis")]
    kurtosis: String,
}

fn scaled(series: &DatedSeries, factor: f64) -> DatedSeries {
    series.map_values(series.name(), |v| Some(v * factor))
}

fn value_rows(series: &DatedSeries, precision: usize) -> Vec<ValueRow> {
    series
        .iter()
        .map(|obs| ValueRow {
            date: obs.date.to_string(),
            value: format_value(obs.value, precision),
        })
        .collect()
}

fn tail<T>(mut rows: Vec<T>, n: Option<usize>) -> Vec<T> {
    if let Some(n) = n {
        let skip = rows.len().saturating_sub(n);
        rows.drain(..skip);
    }
    rows
}

/// Execute the transform command.
pub fn execute(args: TransformArgs, format: OutputFormat) -> Result<()> {
    let mut series = read_series(&args.input, args.column.as_deref())?;
    let mut frequency = args.frequency;
    if let Some(target) = args.resample {
        series = standardize_frequency(&series, target, Aggregation::Last)?;
        frequency = target;
    }

    let per_year = frequency.periods_per_year();
    let per_month = frequency.periods_per_month();
    let window_years = args.window_years;

    let rows = match args.kind {
        TransformKind::Yoy => {
            let yoy = year_over_year(&series, args.periods.unwrap_or(per_year))?;
            value_rows(&scaled(&yoy, 100.0), 2)
        }
        TransformKind::Annualized3m => {
            let window = args.periods.unwrap_or(frequency.periods_per_quarter());
            let growth = annualized_short_term_change(&series, window, per_year)?;
            value_rows(&scaled(&growth, 100.0), 2)
        }
        TransformKind::Change1m => {
            let change = period_change(&series, args.periods.unwrap_or(per_month))?;
            value_rows(&scaled(&change, 100.0), 2)
        }
        TransformKind::Difference => {
            value_rows(&difference(&series, args.periods.unwrap_or(1))?, 4)
        }
        TransformKind::Acceleration => {
            let lag = args.periods.unwrap_or(per_month);
            value_rows(&second_difference(&series, lag, lag)?, 4)
        }
        TransformKind::Zscore => value_rows(&rolling_zscore(&series, window_years, per_year)?, 4),
        TransformKind::ZscoreChange => {
            let change = zscore_change(
                &series,
                window_years,
                per_year,
                args.periods.unwrap_or(per_month),
            )?;
            value_rows(&change, 4)
        }
        TransformKind::Percentile => {
            value_rows(&percentile_rank(&series, window_years, per_year)?, 2)
        }
        TransformKind::Inflection => {
            detect_inflection(&series, args.lookback, args.sensitivity)?
                .into_iter()
                .map(|obs| ValueRow {
                    date: obs.date.to_string(),
                    value: obs.value.to_string(),
                })
                .collect()
        }
        TransformKind::Stats => {
            let window = RollingWindow::years(window_years, per_year)?;
            let stats = rolling_stats(&series, window)?;
            let rows: Vec<StatsRow> = series
                .dates()
                .iter()
                .enumerate()
                .map(|(t, date)| StatsRow {
                    date: date.to_string(),
                    mean: format_value(stats.mean.value(t), 4),
                    std: format_value(stats.std.value(t), 4),
                    min: format_value(stats.min.value(t), 4),
                    max: format_value(stats.max.value(t), 4),
                    median: format_value(stats.median.value(t), 4),
                    skew: format_value(stats.skew.value(t), 4),
                    kurtosis: format_value(stats.kurtosis.value(t), 4),
                })
                .collect();
            return print_output(&tail(rows, args.tail), format);
        }
        TransformKind::Snapshot => return print_snapshot(&series, frequency, format),
        TransformKind::Values => value_rows(&series, 4),
    };

    print_output(&tail(rows, args.tail), format)
}

fn print_snapshot(series: &DatedSeries, frequency: Frequency, format: OutputFormat) -> Result<()> {
    let snapshot = latest_snapshot(series, frequency)?;
    let pct = |v: Option<f64>| crate::output::format_pct(v.map(|x| x * 100.0));
    let rows = vec![
        KeyValue::new("Date", snapshot.date.map_or_else(|| "n/a".to_string(), |d| d.to_string())),
        KeyValue::new("Latest", format_value(snapshot.latest, 4)),
        KeyValue::new("YoY", pct(snapshot.yoy)),
        KeyValue::new("3M Annualized", pct(snapshot.annualized_3m)),
        KeyValue::new("1M Change", pct(snapshot.change_1m)),
        KeyValue::new("Z-Score (3Y)", format_value(snapshot.zscore_3y, 2)),
        KeyValue::new("Z-Score (5Y)", format_value(snapshot.zscore_5y, 2)),
        KeyValue::new("Percentile (3Y)", format_value(snapshot.percentile_3y, 1)),
    ];

    match format {
        OutputFormat::Json => print_json(&snapshot),
        OutputFormat::Table => {
            print_header(&format!("Snapshot: {}", series.name()));
            print_output(&rows, format)
        }
        OutputFormat::Csv | OutputFormat::Minimal => print_output(&rows, format),
    }
}
