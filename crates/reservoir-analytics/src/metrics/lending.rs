//! Fed lending facility stress.
//!
//! Lending balances are ranked against their own trailing history; a sharp
//! year-over-year surge escalates the band by one level.

use serde::{Deserialize, Serialize};

use reservoir_core::{Classified, DatedSeries, Frequency, ReservoirResult};
use reservoir_math::transforms::{percentile_rank_with, year_over_year};
use reservoir_math::RollingWindow;

use super::{all_finite, readings, ReadingSeries, StressLevel};
use crate::error::{check_ascending, check_finite, Validate, ValidationError};

/// Lending stress settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingStressConfig {
    /// Trailing window for the percentile rank.
    pub window_years: usize,
    /// Percentile at which stress becomes Elevated.
    pub elevated_percentile: f64,
    /// Percentile at which stress becomes Stress.
    pub stress_percentile: f64,
    /// Year-over-year growth (percent) that counts as a surge.
    pub surge_yoy_pct: f64,
}

impl Default for LendingStressConfig {
    fn default() -> Self {
        Self {
            window_years: 3,
            elevated_percentile: 75.0,
            stress_percentile: 90.0,
            surge_yoy_pct: 100.0,
        }
    }
}

impl LendingStressConfig {
    /// Sets the percentile window.
    #[must_use]
    pub fn with_window_years(mut self, years: usize) -> Self {
        self.window_years = years;
        self
    }

    /// Sets the surge threshold.
    #[must_use]
    pub fn with_surge_yoy_pct(mut self, pct: f64) -> Self {
        self.surge_yoy_pct = pct;
        self
    }
}

impl Validate for LendingStressConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.window_years == 0 {
            errors.push(ValidationError::new("window_years", "must be positive"));
        }
        check_ascending(
            &mut errors,
            "elevated_percentile",
            self.elevated_percentile,
            "stress_percentile",
            self.stress_percentile,
        );
        check_finite(&mut errors, "surge_yoy_pct", self.surge_yoy_pct);
        errors
    }
}

/// Lending stress at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LendingStressReading {
    /// Lending facility balance.
    pub lending_level: f64,
    /// Trailing percentile rank, 0-100.
    pub percentile: f64,
    /// Year-over-year change in percent, when a year of history exists.
    pub yoy_pct: Option<f64>,
    /// True if the YoY change reached the surge threshold.
    pub surge: bool,
    /// Headline score (the percentile).
    pub score: f64,
    /// Stress band, escalated on a surge.
    pub level: StressLevel,
}

/// Classifies lending stress from its trailing percentile and YoY change.
pub fn lending_stress_reading(
    lending_level: f64,
    percentile: f64,
    yoy_pct: Option<f64>,
    config: &LendingStressConfig,
) -> Classified<LendingStressReading> {
    if !all_finite(&[lending_level, percentile]) {
        return Classified::InsufficientData;
    }

    let yoy_pct = yoy_pct.filter(|y| y.is_finite());
    let surge = yoy_pct.is_some_and(|y| y >= config.surge_yoy_pct);
    let mut level =
        StressLevel::from_score(percentile, config.elevated_percentile, config.stress_percentile);
    if surge {
        level = level.escalate();
    }

    Classified::Level(LendingStressReading {
        lending_level,
        percentile,
        yoy_pct,
        surge,
        score: percentile,
        level,
    })
}

/// Lending stress at every timestamp.
///
/// The percentile window needs half its length in valid observations.
pub fn lending_stress(
    lending: &DatedSeries,
    frequency: Frequency,
    config: &LendingStressConfig,
) -> ReservoirResult<ReadingSeries<LendingStressReading>> {
    let periods_per_year = frequency.periods_per_year();
    let window = RollingWindow::years(config.window_years, periods_per_year)?.half_filled();
    let percentile = percentile_rank_with(lending, window)?;
    let yoy = year_over_year(lending, periods_per_year)?;

    Ok(readings(lending, |t| {
        match (lending.value(t), percentile.value(t)) {
            (Some(level), Some(pct)) => {
                lending_stress_reading(level, pct, yoy.value(t).map(|y| y * 100.0), config)
            }
            _ => Classified::InsufficientData,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_percentile_bands() {
        let config = LendingStressConfig::default();
        let level = |pct| {
            lending_stress_reading(10.0, pct, Some(5.0), &config)
                .into_level()
                .unwrap()
                .level
        };
        assert_eq!(level(50.0), StressLevel::Normal);
        assert_eq!(level(75.0), StressLevel::Elevated);
        assert_eq!(level(95.0), StressLevel::Stress);
    }

    #[test]
    fn test_surge_escalates() {
        let reading = lending_stress_reading(20.0, 60.0, Some(150.0), &LendingStressConfig::default())
            .into_level()
            .unwrap();
        assert!(reading.surge);
        assert_eq!(reading.level, StressLevel::Elevated);

        let no_history = lending_stress_reading(20.0, 60.0, None, &LendingStressConfig::default());
        assert!(!no_history.level().unwrap().surge);
    }

    #[test]
    fn test_weekly_series() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        // Flat for two years, then a spike
        let lending = DatedSeries::from_values(
            "lending",
            (0..110).map(|i| {
                let value = if i < 109 { 10.0 + f64::from(i % 3) } else { 80.0 };
                (start + chrono::Duration::weeks(i64::from(i)), value)
            }),
        )
        .unwrap();

        let stress = lending_stress(&lending, Frequency::Weekly, &LendingStressConfig::default()).unwrap();
        // Half of a 156-week window
        assert!(stress[76].value.is_insufficient());
        assert!(!stress[77].value.is_insufficient());

        let latest = stress[109].value.level().unwrap();
        assert_eq!(latest.percentile, 100.0);
        assert!(latest.surge);
        assert_eq!(latest.level, StressLevel::Stress);
    }
}
