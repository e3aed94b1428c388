//! Reserve demand proxy: the reverse repo's share of overnight liquidity.
//!
//! Cash parked at the RRP facility instead of held as reserves signals
//! weak demand for reserves; above half of the total it flags a crisis.

use serde::{Deserialize, Serialize};

use reservoir_core::{Classified, DatedSeries, ReservoirResult};

use super::{all_finite, band_score, readings, ReadingSeries, StressLevel};
use crate::error::{check_ascending, Validate, ValidationError};

/// Ratio above which the crisis indicator is set.
pub const CRISIS_RATIO: f64 = 0.5;

/// Demand proxy band thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandProxyConfig {
    /// Ratio at which demand becomes Elevated.
    pub elevated_threshold: f64,
    /// Ratio above which demand is Stress.
    pub stress_threshold: f64,
}

impl Default for DemandProxyConfig {
    fn default() -> Self {
        Self {
            elevated_threshold: 0.3,
            stress_threshold: CRISIS_RATIO,
        }
    }
}

impl DemandProxyConfig {
    /// Sets both thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, elevated: f64, stress: f64) -> Self {
        self.elevated_threshold = elevated;
        self.stress_threshold = stress;
        self
    }

    fn classify(&self, ratio: f64) -> StressLevel {
        if ratio > self.stress_threshold {
            StressLevel::Stress
        } else if ratio >= self.elevated_threshold {
            StressLevel::Elevated
        } else {
            StressLevel::Normal
        }
    }

    fn score(&self, ratio: f64, level: StressLevel) -> f64 {
        match level {
            StressLevel::Normal => band_score(ratio, 0.0, self.elevated_threshold, 0.0, 50.0),
            StressLevel::Elevated => {
                band_score(ratio, self.elevated_threshold, self.stress_threshold, 50.0, 90.0)
            }
            StressLevel::Stress => band_score(ratio, self.stress_threshold, 1.0, 90.0, 100.0),
        }
    }
}

impl Validate for DemandProxyConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.elevated_threshold <= 0.0 {
            errors.push(ValidationError::new("elevated_threshold", "must be positive"));
        }
        check_ascending(
            &mut errors,
            "elevated_threshold",
            self.elevated_threshold,
            "stress_threshold",
            self.stress_threshold,
        );
        if self.stress_threshold >= 1.0 {
            errors.push(ValidationError::new("stress_threshold", "must be below 1"));
        }
        errors
    }
}

/// Reserve demand proxy at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandProxyReading {
    /// Overnight reverse repo balance.
    pub reverse_repo: f64,
    /// Reserve balances.
    pub reserves: f64,
    /// `RRP + Reserves`.
    pub total_overnight_liquidity: f64,
    /// `RRP / (RRP + Reserves)`.
    pub ratio: f64,
    /// Demand band.
    pub level: StressLevel,
    /// Demand score, 0-100.
    pub score: f64,
    /// True if the ratio exceeds one half.
    pub crisis_indicator: bool,
}

/// Computes the demand proxy. Zero total liquidity is insufficient data.
pub fn demand_proxy_reading(
    reverse_repo: f64,
    reserves: f64,
    config: &DemandProxyConfig,
) -> Classified<DemandProxyReading> {
    let total = reverse_repo + reserves;
    if !all_finite(&[reverse_repo, reserves]) || total == 0.0 {
        return Classified::InsufficientData;
    }

    let ratio = reverse_repo / total;
    let level = config.classify(ratio);
    Classified::Level(DemandProxyReading {
        reverse_repo,
        reserves,
        total_overnight_liquidity: total,
        ratio,
        level,
        score: config.score(ratio, level),
        crisis_indicator: ratio > CRISIS_RATIO,
    })
}

/// Demand proxy at every timestamp of two aligned series.
pub fn demand_proxy(
    reverse_repo: &DatedSeries,
    reserves: &DatedSeries,
    config: &DemandProxyConfig,
) -> ReservoirResult<ReadingSeries<DemandProxyReading>> {
    reverse_repo.ensure_aligned(reserves)?;
    Ok(readings(reverse_repo, |t| {
        match (reverse_repo.value(t), reserves.value(t)) {
            (Some(rrp), Some(reserves)) => demand_proxy_reading(rrp, reserves, config),
            _ => Classified::InsufficientData,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equal_balances_give_half() {
        let reading = demand_proxy_reading(1800.0, 1800.0, &DemandProxyConfig::default())
            .into_level()
            .unwrap();
        assert_eq!(reading.ratio, 0.5);
        assert!(!reading.crisis_indicator);
        assert_eq!(reading.level, StressLevel::Elevated);
        assert_relative_eq!(reading.score, 90.0);
        assert_relative_eq!(reading.total_overnight_liquidity, 3600.0);
    }

    #[test]
    fn test_rrp_above_reserves_is_crisis() {
        let reading = demand_proxy_reading(2000.0, 1800.0, &DemandProxyConfig::default())
            .into_level()
            .unwrap();
        assert!(reading.crisis_indicator);
        assert_eq!(reading.level, StressLevel::Stress);
        assert!(reading.score > 90.0);
    }

    #[test]
    fn test_normal_band_score() {
        let reading = demand_proxy_reading(150.0, 850.0, &DemandProxyConfig::default())
            .into_level()
            .unwrap();
        assert_eq!(reading.level, StressLevel::Normal);
        assert_relative_eq!(reading.score, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_total_is_insufficient() {
        assert!(demand_proxy_reading(0.0, 0.0, &DemandProxyConfig::default()).is_insufficient());
    }
}
