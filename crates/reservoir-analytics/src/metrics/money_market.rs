//! Money-market stress from the reverse-repo level and its acceleration.

use serde::{Deserialize, Serialize};

use reservoir_core::{Classified, DatedSeries, Frequency, ReservoirResult};
use reservoir_math::transforms::{period_change, second_difference};

use super::{all_finite, clamp_score, readings, ReadingSeries, StressLevel};
use crate::error::{check_ascending, check_finite, check_range, Validate, ValidationError};

/// Money-market stress settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyMarketConfig {
    /// RRP level (billions) that maps to a level score of 100.
    pub level_ceiling: f64,
    /// Monthly acceleration (billions) that moves the acceleration score by 50.
    pub acceleration_scale: f64,
    /// Weight of the level score; the acceleration score takes the rest.
    pub level_weight: f64,
    /// Score at which stress becomes Elevated.
    pub elevated_threshold: f64,
    /// Score at which stress becomes Stress.
    pub stress_threshold: f64,
}

impl Default for MoneyMarketConfig {
    fn default() -> Self {
        Self {
            level_ceiling: 2200.0,
            acceleration_scale: 500.0,
            level_weight: 0.7,
            elevated_threshold: 35.0,
            stress_threshold: 65.0,
        }
    }
}

impl MoneyMarketConfig {
    /// Sets the level weight.
    #[must_use]
    pub fn with_level_weight(mut self, weight: f64) -> Self {
        self.level_weight = weight;
        self
    }

    /// Sets the Elevated and Stress score thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, elevated: f64, stress: f64) -> Self {
        self.elevated_threshold = elevated;
        self.stress_threshold = stress;
        self
    }
}

impl Validate for MoneyMarketConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("level_ceiling", self.level_ceiling),
            ("acceleration_scale", self.acceleration_scale),
        ] {
            check_finite(&mut errors, field, value);
            if value <= 0.0 {
                errors.push(ValidationError::new(field, "must be positive"));
            }
        }
        check_range(&mut errors, "level_weight", self.level_weight, 0.0, 1.0);
        check_ascending(
            &mut errors,
            "elevated_threshold",
            self.elevated_threshold,
            "stress_threshold",
            self.stress_threshold,
        );
        errors
    }
}

/// Money-market stress at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneyMarketReading {
    /// RRP balance.
    pub rrp_level: f64,
    /// One-month change in percent, when available.
    pub change_1m_pct: Option<f64>,
    /// Second difference of the RRP level (one month, then one month).
    pub acceleration: f64,
    /// Level component, 0-100.
    pub level_score: f64,
    /// Acceleration component, 0-100, 50 when flat.
    pub acceleration_score: f64,
    /// Weighted score, 0-100.
    pub score: f64,
    /// Stress band of the score.
    pub level: StressLevel,
}

/// Scores money-market stress from the RRP level and its acceleration.
///
/// The score is non-decreasing in both inputs.
pub fn money_market_reading(
    rrp_level: f64,
    acceleration: f64,
    change_1m_pct: Option<f64>,
    config: &MoneyMarketConfig,
) -> Classified<MoneyMarketReading> {
    if !all_finite(&[rrp_level, acceleration]) {
        return Classified::InsufficientData;
    }

    let level_score = clamp_score(rrp_level / config.level_ceiling * 100.0);
    let acceleration_score = clamp_score(50.0 + acceleration / config.acceleration_scale * 50.0);
    let score = config.level_weight * level_score + (1.0 - config.level_weight) * acceleration_score;

    Classified::Level(MoneyMarketReading {
        rrp_level,
        change_1m_pct: change_1m_pct.filter(|c| c.is_finite()),
        acceleration,
        level_score,
        acceleration_score,
        score,
        level: StressLevel::from_score(score, config.elevated_threshold, config.stress_threshold),
    })
}

/// Money-market stress at every timestamp of the RRP series.
pub fn money_market_stress(
    reverse_repo: &DatedSeries,
    frequency: Frequency,
    config: &MoneyMarketConfig,
) -> ReservoirResult<ReadingSeries<MoneyMarketReading>> {
    let month = frequency.periods_per_month();
    let acceleration = second_difference(reverse_repo, month, month)?;
    let change = period_change(reverse_repo, month)?;

    Ok(readings(reverse_repo, |t| {
        match (reverse_repo.value(t), acceleration.value(t)) {
            (Some(level), Some(accel)) => {
                money_market_reading(level, accel, change.value(t).map(|c| c * 100.0), config)
            }
            _ => Classified::InsufficientData,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn test_flat_acceleration_scores_fifty() {
        let reading = money_market_reading(1100.0, 0.0, None, &MoneyMarketConfig::default())
            .into_level()
            .unwrap();
        assert_relative_eq!(reading.level_score, 50.0);
        assert_relative_eq!(reading.acceleration_score, 50.0);
        assert_relative_eq!(reading.score, 50.0);
        assert_eq!(reading.level, StressLevel::Elevated);
    }

    #[test]
    fn test_monotonic_in_level_and_acceleration() {
        let config = MoneyMarketConfig::default();
        let score = |level, accel| {
            money_market_reading(level, accel, None, &config)
                .into_level()
                .unwrap()
                .score
        };
        assert!(score(500.0, 0.0) <= score(900.0, 0.0));
        assert!(score(500.0, -100.0) <= score(500.0, 100.0));
        assert_relative_eq!(score(5000.0, 5000.0), 100.0);
        assert_relative_eq!(score(0.0, -5000.0), 0.0);
    }

    #[test]
    fn test_daily_series_needs_two_months() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rrp = DatedSeries::from_values(
            "rrp",
            (0..50).map(|i| (start + chrono::Duration::days(i), 1000.0 + 10.0 * i as f64)),
        )
        .unwrap();

        let stress = money_market_stress(&rrp, Frequency::Daily, &MoneyMarketConfig::default()).unwrap();
        assert!(stress[41].value.is_insufficient());
        let reading = stress[42].value.level().unwrap();
        // Linear growth: constant velocity, zero acceleration
        assert_relative_eq!(reading.acceleration, 0.0, epsilon = 1e-9);
        assert_relative_eq!(reading.change_1m_pct.unwrap(), 210.0 / 1210.0 * 100.0, epsilon = 1e-9);
    }
}
