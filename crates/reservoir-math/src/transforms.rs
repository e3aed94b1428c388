//! Pointwise and windowed transforms over dated series.
//!
//! Transforms return fractions, not percent: a 3% YoY change is `0.03`.
//! Callers pick the period constants from
//! [`Frequency`](reservoir_core::Frequency); nothing here inspects timestamp
//! spacing.

use serde::{Deserialize, Serialize};

use reservoir_core::{DatedSeries, ReservoirError, ReservoirResult};

use crate::statistics::{is_degenerate_std, mean, percentile_of_score, sample_std};

/// A trailing window of observations with a minimum-valid-count requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindow {
    /// Number of trailing observations, including the current one.
    pub size: usize,
    /// Minimum number of present values required in the window.
    pub min_periods: usize,
}

impl RollingWindow {
    /// Creates a window that requires every observation to be present.
    pub fn new(size: usize) -> ReservoirResult<Self> {
        let size = ReservoirError::require_positive("window", size)?;
        Ok(Self {
            size,
            min_periods: size,
        })
    }

    /// Creates a full window spanning `window_years` years.
    pub fn years(window_years: usize, periods_per_year: usize) -> ReservoirResult<Self> {
        ReservoirError::require_positive("window_years", window_years)?;
        ReservoirError::require_positive("periods_per_year", periods_per_year)?;
        let size = window_years.checked_mul(periods_per_year).ok_or_else(|| {
            ReservoirError::invalid_parameter(
                "window_years",
                format!("{window_years} years of {periods_per_year} periods overflows"),
            )
        })?;
        Self::new(size)
    }

    /// Sets the minimum number of present values.
    pub fn with_min_periods(self, min_periods: usize) -> ReservoirResult<Self> {
        ReservoirError::require_positive("min_periods", min_periods)?;
        if min_periods > self.size {
            return Err(ReservoirError::invalid_parameter(
                "min_periods",
                format!("{} exceeds window size {}", min_periods, self.size),
            ));
        }
        Ok(Self {
            min_periods,
            ..self
        })
    }

    /// Accepts a window that is at least half filled.
    #[must_use]
    pub fn half_filled(self) -> Self {
        Self {
            min_periods: (self.size / 2).max(1),
            ..self
        }
    }

    /// Present values of the window ending at `end` (inclusive).
    ///
    /// Returns `None` if fewer than `min_periods` values are present.
    pub(crate) fn present_values(&self, values: &[Option<f64>], end: usize) -> Option<Vec<f64>> {
        let start = (end + 1).saturating_sub(self.size);
        let present: Vec<f64> = values[start..=end].iter().flatten().copied().collect();
        (present.len() >= self.min_periods).then_some(present)
    }
}

fn lagged<F>(series: &DatedSeries, periods: usize, name: String, f: F) -> ReservoirResult<DatedSeries>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    let periods = ReservoirError::require_positive("periods", periods)?;
    let values = series.values();
    let out = (0..values.len())
        .map(|t| {
            let lag = t.checked_sub(periods)?;
            f(values[t]?, values[lag]?)
        })
        .collect();
    series.derive(name, out)
}

/// Year-over-year change: `S[t] / S[t - periods] - 1`.
///
/// Missing for the first `periods` entries and wherever either value is missing.
pub fn year_over_year(series: &DatedSeries, periods: usize) -> ReservoirResult<DatedSeries> {
    lagged(series, periods, format!("{}_yoy", series.name()), |now, then| {
        Some(now / then - 1.0)
    })
}

/// Fractional change over `periods` observations: `S[t] / S[t - periods] - 1`.
pub fn period_change(series: &DatedSeries, periods: usize) -> ReservoirResult<DatedSeries> {
    lagged(
        series,
        periods,
        format!("{}_change_{}", series.name(), periods),
        |now, then| Some(now / then - 1.0),
    )
}

/// Short-window change compounded to an annual rate.
///
/// `(S[t] / S[t - window])^(periods_per_year / window) - 1`. A ratio whose
/// power has no real value yields a missing value.
pub fn annualized_short_term_change(
    series: &DatedSeries,
    window: usize,
    periods_per_year: usize,
) -> ReservoirResult<DatedSeries> {
    let periods_per_year = ReservoirError::require_positive("periods_per_year", periods_per_year)?;
    let exponent = periods_per_year as f64 / window.max(1) as f64;
    lagged(
        series,
        window,
        format!("{}_annualized_{}", series.name(), window),
        |now, then| Some((now / then).powf(exponent) - 1.0),
    )
}

/// Absolute difference: `S[t] - S[t - periods]`.
pub fn difference(series: &DatedSeries, periods: usize) -> ReservoirResult<DatedSeries> {
    lagged(
        series,
        periods,
        format!("{}_diff_{}", series.name(), periods),
        |now, then| Some(now - then),
    )
}

/// First difference of an already-computed growth or velocity series.
pub fn acceleration(velocity: &DatedSeries, periods: usize) -> ReservoirResult<DatedSeries> {
    lagged(
        velocity,
        periods,
        format!("{}_accel_{}", velocity.name(), periods),
        |now, then| Some(now - then),
    )
}

/// Second difference of a level series: the acceleration of its `first`-period difference.
pub fn second_difference(
    series: &DatedSeries,
    first: usize,
    second: usize,
) -> ReservoirResult<DatedSeries> {
    let velocity = difference(series, first)?;
    acceleration(&velocity, second)
}

/// Rolling z-score over a full `window_years` window.
///
/// Missing until the trailing window holds `window_years * periods_per_year`
/// present values, and wherever the window std is zero.
pub fn rolling_zscore(
    series: &DatedSeries,
    window_years: usize,
    periods_per_year: usize,
) -> ReservoirResult<DatedSeries> {
    rolling_zscore_with(series, RollingWindow::years(window_years, periods_per_year)?)
}

/// Rolling z-score with an explicit window and minimum count.
pub fn rolling_zscore_with(
    series: &DatedSeries,
    window: RollingWindow,
) -> ReservoirResult<DatedSeries> {
    let values = series.values();
    let out = (0..values.len())
        .map(|t| {
            let current = values[t]?;
            let present = window.present_values(values, t)?;
            let m = mean(&present)?;
            let std = sample_std(&present)?;
            if is_degenerate_std(std, m) {
                return None;
            }
            Some((current - m) / std)
        })
        .collect();
    series.derive(format!("{}_zscore_{}", series.name(), window.size), out)
}

/// Change in the full-window rolling z-score over `change_periods`.
pub fn zscore_change(
    series: &DatedSeries,
    window_years: usize,
    periods_per_year: usize,
    change_periods: usize,
) -> ReservoirResult<DatedSeries> {
    let zscore = rolling_zscore(series, window_years, periods_per_year)?;
    difference(&zscore, change_periods)
}

/// Rolling percentile rank (0-100) over a full `window_years` window.
///
/// Ties take the average rank.
pub fn percentile_rank(
    series: &DatedSeries,
    window_years: usize,
    periods_per_year: usize,
) -> ReservoirResult<DatedSeries> {
    percentile_rank_with(series, RollingWindow::years(window_years, periods_per_year)?)
}

/// Rolling percentile rank with an explicit window and minimum count.
pub fn percentile_rank_with(
    series: &DatedSeries,
    window: RollingWindow,
) -> ReservoirResult<DatedSeries> {
    let values = series.values();
    let out = (0..values.len())
        .map(|t| {
            let current = values[t]?;
            let present = window.present_values(values, t)?;
            percentile_of_score(&present, current)
        })
        .collect();
    series.derive(format!("{}_pctile_{}", series.name(), window.size), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[Option<f64>]) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DatedSeries::from_observations(
            "x",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    fn full(values: &[f64]) -> DatedSeries {
        series(&values.iter().copied().map(Some).collect::<Vec<_>>())
    }

    #[test]
    fn test_year_over_year() {
        let s = full(&[100.0, 110.0, 120.0, 132.0]);
        let yoy = year_over_year(&s, 2).unwrap();
        assert_eq!(yoy.value(0), None);
        assert_eq!(yoy.value(1), None);
        assert_relative_eq!(yoy.value(2).unwrap(), 0.2);
        assert_relative_eq!(yoy.value(3).unwrap(), 0.2);
        assert_eq!(yoy.dates(), s.dates());
    }

    #[test]
    fn test_missing_lag_propagates() {
        let s = series(&[Some(100.0), None, Some(120.0), Some(130.0)]);
        let yoy = year_over_year(&s, 2).unwrap();
        assert_relative_eq!(yoy.value(2).unwrap(), 0.2);
        assert_eq!(yoy.value(3), None);
    }

    #[test]
    fn test_zero_periods_rejected() {
        let s = full(&[1.0, 2.0]);
        assert!(year_over_year(&s, 0).is_err());
        assert!(difference(&s, 0).is_err());
        assert!(rolling_zscore(&s, 0, 252).is_err());
        assert!(percentile_rank(&s, 1, 0).is_err());
    }

    #[test]
    fn test_zero_lag_value_is_missing() {
        let s = full(&[0.0, 5.0]);
        assert_eq!(year_over_year(&s, 1).unwrap().value(1), None);
    }

    #[test]
    fn test_annualized_change() {
        // 2% over a quarter of monthly data compounds four times
        let s = full(&[100.0, 101.0, 101.5, 102.0]);
        let ann = annualized_short_term_change(&s, 3, 12).unwrap();
        assert_relative_eq!(ann.value(3).unwrap(), 1.02_f64.powi(4) - 1.0, epsilon = 1e-12);
        assert_eq!(ann.value(2), None);

        // A negative ratio raised to 1.5 has no real value
        let negative = full(&[-1.0, 0.0, 1.0]);
        assert_eq!(annualized_short_term_change(&negative, 2, 3).unwrap().value(2), None);
    }

    #[test]
    fn test_difference_and_acceleration() {
        let s = full(&[1.0, 2.0, 4.0, 7.0, 11.0]);
        let diff = difference(&s, 1).unwrap();
        assert_eq!(diff.values(), &[None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);

        let accel = second_difference(&s, 1, 1).unwrap();
        assert_eq!(accel.values(), &[None, None, Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(acceleration(&diff, 1).unwrap().values(), accel.values());
    }

    #[test]
    fn test_rolling_zscore_waits_for_full_window() {
        let s = full(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let z = rolling_zscore_with(&s, RollingWindow::new(3).unwrap()).unwrap();
        assert_eq!(z.value(0), None);
        assert_eq!(z.value(1), None);
        // window [1,2,3]: mean 2, sample std 1
        assert_relative_eq!(z.value(2).unwrap(), 1.0);
        assert_relative_eq!(z.value(4).unwrap(), 1.0);
    }

    #[test]
    fn test_rolling_zscore_constant_window_is_missing() {
        let s = full(&[0.1; 6]);
        let z = rolling_zscore_with(&s, RollingWindow::new(3).unwrap()).unwrap();
        assert!(z.values().iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_zscore_missing_in_window() {
        let s = series(&[Some(1.0), None, Some(3.0), Some(4.0), Some(6.0)]);
        let window = RollingWindow::new(3).unwrap();
        let z = rolling_zscore_with(&s, window).unwrap();
        assert_eq!(z.value(2), None);
        assert_eq!(z.value(3), None);
        assert!(z.value(4).is_some());

        let relaxed = rolling_zscore_with(&s, window.with_min_periods(2).unwrap()).unwrap();
        assert!(relaxed.value(2).is_some());
    }

    #[test]
    fn test_percentile_rank() {
        let s = full(&[3.0, 1.0, 2.0, 2.0, 5.0]);
        let p = percentile_rank_with(&s, RollingWindow::new(4).unwrap()).unwrap();
        assert_eq!(p.value(2), None);
        // window [3,1,2,2], current 2 ties with itself
        assert_relative_eq!(p.value(3).unwrap(), 62.5);
        assert_relative_eq!(p.value(4).unwrap(), 100.0);
    }

    #[test]
    fn test_zscore_change() {
        let s = full(&[1.0, 3.0, 2.0, 5.0, 4.0, 8.0]);
        let change = zscore_change(&s, 1, 3, 1).unwrap();
        let z = rolling_zscore(&s, 1, 3).unwrap();
        assert_eq!(change.value(2), None);
        assert_relative_eq!(
            change.value(4).unwrap(),
            z.value(4).unwrap() - z.value(3).unwrap()
        );
    }

    #[test]
    fn test_window_validation() {
        assert!(RollingWindow::new(0).is_err());
        let w = RollingWindow::new(10).unwrap();
        assert!(w.with_min_periods(11).is_err());
        assert!(w.with_min_periods(0).is_err());
        assert_eq!(w.half_filled().min_periods, 5);
        assert_eq!(RollingWindow::years(3, 52).unwrap().size, 156);
    }

    #[test]
    fn test_window_years_overflow_rejected() {
        assert!(RollingWindow::years(usize::MAX / 2, 252).is_err());
        assert!(RollingWindow::years(usize::MAX, 1).is_ok());
    }
}
