//! Local peak and trough detection.

use serde::{Deserialize, Serialize};
use std::fmt;

use reservoir_core::{DatedSeries, Observation, ReservoirError, ReservoirResult};

/// Turning-point marker for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Inflection {
    /// Local maximum
    Peak,
    /// Local minimum
    Trough,
    /// Neither
    #[default]
    None,
}

impl Inflection {
    /// Numeric code: `1` for a peak, `-1` for a trough, `0` otherwise.
    #[must_use]
    pub fn signum(self) -> i8 {
        match self {
            Inflection::Peak => 1,
            Inflection::Trough => -1,
            Inflection::None => 0,
        }
    }
}

impl fmt::Display for Inflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Inflection::Peak => "peak",
            Inflection::Trough => "trough",
            Inflection::None => "-",
        };
        write!(f, "{name}")
    }
}

/// Marks local peaks and troughs.
///
/// A peak is a value equal to the maximum of the centered `lookback` window
/// and strictly above both neighbours; troughs mirror this. With a positive
/// `sensitivity_pct`, the absolute % change over `lookback` observations must
/// also reach `sensitivity_pct`. Any missing value in the window, or a window
/// running past either end of the series, marks no turning point.
pub fn detect_inflection(
    series: &DatedSeries,
    lookback: usize,
    sensitivity_pct: f64,
) -> ReservoirResult<Vec<Observation<Inflection>>> {
    let lookback = ReservoirError::require_positive("lookback", lookback)?;
    if !sensitivity_pct.is_finite() || sensitivity_pct < 0.0 {
        return Err(ReservoirError::invalid_parameter(
            "sensitivity_pct",
            format!("{sensitivity_pct} must be a non-negative number"),
        ));
    }

    let values = series.values();
    let offset = (lookback - 1) / 2;

    let classify = |t: usize| -> Option<Inflection> {
        let end = t + offset;
        let start = (end + 1).checked_sub(lookback)?;
        let window = values.get(start..=end)?;
        let window: Vec<f64> = window.iter().copied().collect::<Option<_>>()?;

        let current = values[t]?;
        let prev = values[t.checked_sub(1)?]?;
        let next = (*values.get(t + 1)?)?;

        let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = window.iter().copied().fold(f64::INFINITY, f64::min);

        let marker = if current == hi && prev < current && next < current {
            Inflection::Peak
        } else if current == lo && prev > current && next > current {
            Inflection::Trough
        } else {
            return None;
        };

        if sensitivity_pct > 0.0 {
            let base = values[t.checked_sub(lookback)?]?;
            let move_pct = ((current / base - 1.0) * 100.0).abs();
            if !move_pct.is_finite() || move_pct < sensitivity_pct {
                return None;
            }
        }
        Some(marker)
    };

    Ok(series
        .dates()
        .iter()
        .enumerate()
        .map(|(t, date)| Observation::new(*date, classify(t).unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn full(values: &[f64]) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DatedSeries::from_values(
            "x",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    fn markers(result: &[Observation<Inflection>]) -> Vec<i8> {
        result.iter().map(|o| o.value.signum()).collect()
    }

    #[test]
    fn test_peak_and_trough() {
        let s = full(&[1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.5, 3.0]);
        let result = detect_inflection(&s, 3, 0.0).unwrap();
        assert_eq!(markers(&result), vec![0, 0, 1, 0, 0, -1, 0, 0]);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let s = full(&[1.0, 3.0, 3.0, 1.0]);
        let result = detect_inflection(&s, 3, 0.0).unwrap();
        assert!(result.iter().all(|o| o.value == Inflection::None));
    }

    #[test]
    fn test_sensitivity_filters_small_moves() {
        let s = full(&[100.0, 100.5, 101.0, 100.5, 100.0, 99.5]);
        assert_eq!(detect_inflection(&s, 2, 0.0).unwrap()[2].value, Inflection::Peak);
        // 1% over two observations is below a 5% threshold
        assert_eq!(detect_inflection(&s, 2, 5.0).unwrap()[2].value, Inflection::None);
        assert_eq!(detect_inflection(&s, 2, 0.5).unwrap()[2].value, Inflection::Peak);
    }

    #[test]
    fn test_invalid_parameters() {
        let s = full(&[1.0, 2.0, 1.0]);
        assert!(detect_inflection(&s, 0, 0.0).is_err());
        assert!(detect_inflection(&s, 3, -1.0).is_err());
    }
}
