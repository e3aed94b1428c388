//! Rolling descriptive statistics.

use reservoir_core::{DatedSeries, ReservoirResult};

use crate::statistics;
use crate::transforms::RollingWindow;

/// Rolling statistics, one series per statistic, all on the input's timestamps.
///
/// Unlike the z-score, a statistic is computed whenever the window holds
/// `min_periods` present values, even if the current value is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStats {
    /// Window mean.
    pub mean: DatedSeries,
    /// Sample standard deviation.
    pub std: DatedSeries,
    /// Window minimum.
    pub min: DatedSeries,
    /// Window maximum.
    pub max: DatedSeries,
    /// Window median.
    pub median: DatedSeries,
    /// Bias-adjusted skewness.
    pub skew: DatedSeries,
    /// Bias-adjusted excess kurtosis.
    pub kurtosis: DatedSeries,
}

/// Computes rolling mean, std, min, max, median, skew and kurtosis.
pub fn rolling_stats(series: &DatedSeries, window: RollingWindow) -> ReservoirResult<RollingStats> {
    let values = series.values();
    let windows: Vec<Option<Vec<f64>>> = (0..values.len())
        .map(|t| window.present_values(values, t))
        .collect();

    let column = |label: &str, stat: fn(&[f64]) -> Option<f64>| {
        let out = windows
            .iter()
            .map(|w| w.as_deref().and_then(stat))
            .collect();
        series.derive(format!("{}_rolling_{}", series.name(), label), out)
    };

    Ok(RollingStats {
        mean: column("mean", statistics::mean)?,
        std: column("std", statistics::sample_std)?,
        min: column("min", statistics::min)?,
        max: column("max", statistics::max)?,
        median: column("median", statistics::median)?,
        skew: column("skew", statistics::skewness)?,
        kurtosis: column("kurt", statistics::excess_kurtosis)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[Option<f64>]) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        DatedSeries::from_observations(
            "x",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_rolling_stats_full_window() {
        let s = series(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(10.0)]);
        let stats = rolling_stats(&s, RollingWindow::new(5).unwrap()).unwrap();

        assert_eq!(stats.mean.value(3), None);
        assert_relative_eq!(stats.mean.value(4).unwrap(), 4.0);
        assert_relative_eq!(stats.min.value(4).unwrap(), 1.0);
        assert_relative_eq!(stats.max.value(4).unwrap(), 10.0);
        assert_relative_eq!(stats.median.value(4).unwrap(), 3.0);
        assert_relative_eq!(stats.skew.value(4).unwrap(), 1.697_056_274_847_714_3, epsilon = 1e-9);
        assert_relative_eq!(stats.kurtosis.value(4).unwrap(), 3.152, epsilon = 1e-9);
    }

    #[test]
    fn test_rolling_stats_min_periods() {
        let s = series(&[Some(1.0), None, Some(3.0), Some(5.0)]);
        let window = RollingWindow::new(3).unwrap().with_min_periods(2).unwrap();
        let stats = rolling_stats(&s, window).unwrap();

        assert_eq!(stats.mean.value(0), None);
        assert_eq!(stats.mean.value(1), None);
        assert_relative_eq!(stats.mean.value(2).unwrap(), 2.0);
        assert_relative_eq!(stats.mean.value(3).unwrap(), 4.0);
        // Two values are too few for skew
        assert_eq!(stats.skew.value(3), None);
        assert!(stats.mean.name().ends_with("rolling_mean"));
    }
}
