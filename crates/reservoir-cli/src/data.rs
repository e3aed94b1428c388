//! Series acquisition from CSV files.
//!
//! A series file has a header row, a date column and one or more value
//! columns. Empty cells and the usual missing markers (`.`, `NA`, `NaN`)
//! become missing values rather than zeros. Rows are sorted by date and a
//! repeated date keeps its last row.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reservoir_analytics::regime::SeriesInput;
use reservoir_core::indicators::IndicatorCatalog;
use reservoir_core::{DatedSeries, Frequency};
use reservoir_math::resample::{standardize_frequency, Aggregation};

use crate::error::{CliError, CliResult};

const DATE_COLUMNS: [&str; 4] = ["date", "observation_date", "timestamp", "time"];
const MISSING_MARKERS: [&str; 6] = ["", ".", "na", "n/a", "nan", "null"];

/// Parses a date in `YYYY-MM-DD` or `MM/DD/YYYY` form; a trailing time is ignored.
pub fn parse_date(s: &str) -> CliResult<NaiveDate> {
    let s = s.trim();
    let day = s
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%m/%d/%Y"))
        .map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Parses a `KEY=FREQUENCY` override such as `earnings=monthly`.
pub fn parse_frequency_override(s: &str) -> Result<(String, Frequency), String> {
    let (key, frequency) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=FREQUENCY, got '{s}'"))?;
    let frequency = frequency.parse::<Frequency>().map_err(|e| e.to_string())?;
    Ok((key.trim().to_string(), frequency))
}

fn parse_value(path: &Path, line: u64, cell: &str) -> CliResult<Option<f64>> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    cell.replace(',', "")
        .parse::<f64>()
        .map(|v| v.is_finite().then_some(v))
        .map_err(|_| CliError::InvalidValue {
            path: path.to_path_buf(),
            line,
            value: cell.to_string(),
        })
}

/// Reads one series from a CSV file.
///
/// The date column is the first header named like a date, else the first
/// column. The value column is `column` if given, else the first other column.
pub fn read_series(path: &Path, column: Option<&str>) -> CliResult<DatedSeries> {
    let csv_error = |source| CliError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let date_idx = headers
        .iter()
        .position(|h| DATE_COLUMNS.contains(&h.to_ascii_lowercase().as_str()))
        .unwrap_or(0);
    let value_idx = match column {
        Some(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
            CliError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            }
        })?,
        None => (0..headers.len())
            .find(|i| *i != date_idx)
            .ok_or_else(|| CliError::MissingColumn {
                path: path.to_path_buf(),
                column: "<value>".to_string(),
            })?,
    };

    let mut rows: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, csv::Position::line);
        let Some(date_cell) = record.get(date_idx).filter(|c| !c.is_empty()) else {
            continue;
        };
        let date = parse_date(date_cell)?;
        let value = parse_value(path, line, record.get(value_idx).unwrap_or(""))?;
        if rows.insert(date, value).is_some() {
            tracing::debug!("{}: duplicate date {date}, keeping the last row", path.display());
        }
    }

    let name = column
        .map(str::to_string)
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| headers.get(value_idx).unwrap_or("series").to_string());
    Ok(DatedSeries::from_observations(name, rows)?)
}

/// Series loaded from a data directory, keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    series: BTreeMap<String, DatedSeries>,
    frequencies: BTreeMap<String, Frequency>,
}

impl DataSet {
    /// Loads every `*.csv` file in `dir`.
    ///
    /// A series' frequency comes from `overrides`, else the built-in
    /// indicator catalog, else daily.
    pub fn load_dir(dir: &Path, overrides: &[(String, Frequency)]) -> CliResult<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
            .collect();
        paths.sort();

        let catalog = IndicatorCatalog::all();
        let mut data = Self::default();
        for path in paths {
            let Some(key) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let series = read_series(&path, None)?.renamed(&key);
            let frequency = overrides
                .iter()
                .rev()
                .find(|(k, _)| *k == key)
                .map(|(_, f)| *f)
                .or_else(|| catalog.get(&key).map(|c| c.frequency))
                .unwrap_or(Frequency::Daily);
            tracing::debug!("loaded {key}: {} observations, {frequency}", series.len());
            data.frequencies.insert(key.clone(), frequency);
            data.series.insert(key, series);
        }
        Ok(data)
    }

    /// Returns true if no series was loaded.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Keys of the loaded series, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Frequency of a loaded series.
    pub fn frequency(&self, key: &str) -> Frequency {
        self.frequencies.get(key).copied().unwrap_or_default()
    }

    /// A series by key.
    pub fn get(&self, key: &str) -> Option<&DatedSeries> {
        self.series.get(key)
    }

    /// The first present series among `keys`, with its frequency.
    pub fn input(&self, keys: &[&str]) -> Option<SeriesInput> {
        keys.iter().find_map(|key| {
            self.get(key)
                .map(|series| SeriesInput::new(series.clone(), self.frequency(key)))
        })
    }

    /// A series resampled to `target` (last value per bucket).
    pub fn resampled(&self, key: &str, target: Frequency) -> CliResult<Option<DatedSeries>> {
        self.get(key)
            .map(|series| standardize_frequency(series, target, Aggregation::Last))
            .transpose()
            .map_err(CliError::from)
    }

    /// Every series cut off after `as_of`.
    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        Self {
            series: self
                .series
                .iter()
                .map(|(k, s)| (k.clone(), s.truncate_to(as_of)))
                .collect(),
            frequencies: self.frequencies.clone(),
        }
    }

    /// Latest date across all series.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.series.values().filter_map(|s| s.dates().last().copied()).max()
    }
}
