//! Frequency standardization.
//!
//! Mixed-frequency inputs (daily RRP, weekly H.4.1 items, monthly M2) become
//! comparable once resampled to a common calendar.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use reservoir_core::{DatedSeries, Frequency, ReservoirError, ReservoirResult};

use crate::statistics::mean;

/// How the values falling in one bucket are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Last present value in the bucket
    #[default]
    Last,
    /// Mean of present values
    Mean,
    /// First present value in the bucket
    First,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Last => "last",
            Aggregation::Mean => "mean",
            Aggregation::First => "first",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Aggregation {
    type Err = ReservoirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(Aggregation::Last),
            "mean" => Ok(Aggregation::Mean),
            "first" => Ok(Aggregation::First),
            other => Err(ReservoirError::invalid_parameter(
                "aggregation",
                format!("unknown aggregation '{other}', use last, mean or first"),
            )),
        }
    }
}

/// End date of the bucket containing `date`.
///
/// Weekly buckets end on Sunday, monthly buckets on the last calendar day.
#[must_use]
pub fn bucket_end(date: NaiveDate, target: Frequency) -> NaiveDate {
    match target {
        Frequency::Daily => date,
        Frequency::Weekly => {
            let days_to_sunday = 6 - i64::from(date.weekday().num_days_from_monday());
            date + Duration::days(days_to_sunday)
        }
        Frequency::Monthly => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
                .and_then(|first| first.pred_opt())
                .unwrap_or(date)
        }
    }
}

/// End date of the bucket after the one ending at `end`.
///
/// Daily buckets follow the trading calendar of the input and have no
/// calendar successor.
fn next_bucket_end(end: NaiveDate, target: Frequency) -> Option<NaiveDate> {
    match target {
        Frequency::Daily => None,
        Frequency::Weekly | Frequency::Monthly => {
            end.succ_opt().map(|next| bucket_end(next, target))
        }
    }
}

/// Resamples a series to `target` frequency, labelling each bucket by its end date.
///
/// Weekly and monthly output covers every bucket between the first and last
/// observation, so a lag of `n` rows is always `n` calendar periods. Buckets
/// without a present value are kept as missing.
pub fn standardize_frequency(
    series: &DatedSeries,
    target: Frequency,
    aggregation: Aggregation,
) -> ReservoirResult<DatedSeries> {
    let mut buckets: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for obs in series.iter() {
        let end = bucket_end(obs.date, target);
        if let Some((last_end, values)) = buckets.last_mut() {
            if *last_end == end {
                values.extend(obs.value);
                continue;
            }
        }
        buckets.push((end, obs.value.into_iter().collect()));
    }

    let mut observations: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(buckets.len());
    for (end, values) in buckets {
        let previous = observations.last().map(|(date, _)| *date);
        let mut gap = previous.and_then(|date| next_bucket_end(date, target));
        while let Some(missing) = gap.filter(|date| *date < end) {
            observations.push((missing, None));
            gap = next_bucket_end(missing, target);
        }
        let value = match aggregation {
            Aggregation::Last => values.last().copied(),
            Aggregation::First => values.first().copied(),
            Aggregation::Mean => mean(&values),
        };
        observations.push((end, value));
    }

    let empty = observations.iter().filter(|(_, value)| value.is_none()).count();
    if empty > 0 {
        log::debug!(
            "resampling '{}' to {}: {} empty buckets kept as missing",
            series.name(),
            target,
            empty
        );
    }

    DatedSeries::from_observations(series.name(), observations)
}
