//! Latest value of a series together with its standard transforms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use reservoir_core::{DatedSeries, Frequency, ReservoirResult};

use crate::transforms::{
    annualized_short_term_change, percentile_rank_with, period_change, rolling_zscore_with,
    year_over_year, RollingWindow,
};

/// Latest observation and its derived values, in fraction units.
///
/// The derived fields are only computed when the series spans more than one
/// year of observations; otherwise they are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatestValues {
    /// Date of the last observation.
    pub date: Option<NaiveDate>,
    /// Last observed value (missing if the last observation is missing).
    pub latest: Option<f64>,
    /// Year-over-year change.
    pub yoy: Option<f64>,
    /// Three-month change annualized.
    pub annualized_3m: Option<f64>,
    /// One-month change.
    pub change_1m: Option<f64>,
    /// Three-year rolling z-score.
    pub zscore_3y: Option<f64>,
    /// Five-year rolling z-score.
    pub zscore_5y: Option<f64>,
    /// Three-year percentile rank (0-100).
    pub percentile_3y: Option<f64>,
}

fn last_value(series: &DatedSeries) -> Option<f64> {
    series.latest().and_then(|obs| obs.value)
}

/// Summarizes the end of a series.
///
/// The snapshot z-scores and percentile accept half-filled windows so that
/// a five-year z-score is available from two and a half years of history.
pub fn latest_snapshot(series: &DatedSeries, frequency: Frequency) -> ReservoirResult<LatestValues> {
    let latest = series.latest();
    let mut snapshot = LatestValues {
        date: latest.map(|obs| obs.date),
        latest: latest.and_then(|obs| obs.value),
        ..LatestValues::default()
    };

    let per_year = frequency.periods_per_year();
    if series.len() <= per_year {
        return Ok(snapshot);
    }

    let three_years = RollingWindow::years(3, per_year)?.half_filled();
    let five_years = RollingWindow::years(5, per_year)?.half_filled();

    snapshot.yoy = last_value(&year_over_year(series, per_year)?);
    snapshot.annualized_3m = last_value(&annualized_short_term_change(
        series,
        frequency.periods_per_quarter(),
        per_year,
    )?);
    snapshot.change_1m = last_value(&period_change(series, frequency.periods_per_month())?);
    snapshot.zscore_3y = last_value(&rolling_zscore_with(series, three_years)?);
    snapshot.zscore_5y = last_value(&rolling_zscore_with(series, five_years)?);
    snapshot.percentile_3y = last_value(&percentile_rank_with(series, three_years)?);

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Months;

    fn monthly(values: impl IntoIterator<Item = f64>) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2015, 1, 31).unwrap();
        DatedSeries::from_values(
            "m2",
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (start + Months::new(i as u32), v)),
        )
        .unwrap()
    }

    #[test]
    fn test_short_series_has_only_latest() {
        let s = monthly((0..12).map(f64::from));
        let snap = latest_snapshot(&s, Frequency::Monthly).unwrap();
        assert_eq!(snap.latest, Some(11.0));
        assert!(snap.date.is_some());
        assert_eq!(snap.yoy, None);
        assert_eq!(snap.zscore_3y, None);
    }

    #[test]
    fn test_snapshot_values() {
        // 1% per month growth for four years
        let s = monthly((0..48).map(|i| 100.0 * 1.01_f64.powi(i)));
        let snap = latest_snapshot(&s, Frequency::Monthly).unwrap();

        assert_relative_eq!(snap.yoy.unwrap(), 1.01_f64.powi(12) - 1.0, epsilon = 1e-12);
        assert_relative_eq!(snap.change_1m.unwrap(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(
            snap.annualized_3m.unwrap(),
            1.01_f64.powi(12) - 1.0,
            epsilon = 1e-12
        );
        // Monotonic growth: the latest value tops its window
        assert_relative_eq!(snap.percentile_3y.unwrap(), 100.0);
        assert!(snap.zscore_3y.unwrap() > 1.0);
        assert!(snap.zscore_5y.is_some());
    }

    #[test]
    fn test_empty_series() {
        let snap = latest_snapshot(&DatedSeries::empty("x"), Frequency::Daily).unwrap();
        assert_eq!(snap, LatestValues::default());
    }
}
