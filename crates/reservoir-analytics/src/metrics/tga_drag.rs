//! TGA reserve drag: the Treasury's share of overnight liquidity.
//!
//! A TGA build-up drains reserves one for one, so a rising
//! `TGA / (TGA + Reserves)` ratio signals fiscal drag on bank liquidity.

use serde::{Deserialize, Serialize};
use std::fmt;

use reservoir_core::{Classified, DatedSeries, ReservoirResult};

use super::{all_finite, band_score, readings, ReadingSeries};
use crate::error::{check_ascending, Validate, ValidationError};

/// Fiscal drag band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DragRegime {
    /// Negligible drag
    Minimal,
    /// Typical drag
    Normal,
    /// Meaningful reserve drain
    Elevated,
    /// Severe reserve drain
    Stress,
}

impl fmt::Display for DragRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DragRegime::Minimal => "Minimal",
            DragRegime::Normal => "Normal",
            DragRegime::Elevated => "Elevated",
            DragRegime::Stress => "Stress",
        };
        write!(f, "{name}")
    }
}

/// Ratio thresholds; each is the inclusive lower bound of its band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TgaDragConfig {
    /// Lower bound of Normal.
    pub normal_threshold: f64,
    /// Lower bound of Elevated.
    pub elevated_threshold: f64,
    /// Lower bound of Stress.
    pub stress_threshold: f64,
}

impl Default for TgaDragConfig {
    fn default() -> Self {
        Self {
            normal_threshold: 0.05,
            elevated_threshold: 0.15,
            stress_threshold: 0.25,
        }
    }
}

impl TgaDragConfig {
    /// Sets the three band thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, normal: f64, elevated: f64, stress: f64) -> Self {
        self.normal_threshold = normal;
        self.elevated_threshold = elevated;
        self.stress_threshold = stress;
        self
    }

    /// Bands a ratio.
    #[must_use]
    pub fn classify(&self, ratio: f64) -> DragRegime {
        if ratio >= self.stress_threshold {
            DragRegime::Stress
        } else if ratio >= self.elevated_threshold {
            DragRegime::Elevated
        } else if ratio >= self.normal_threshold {
            DragRegime::Normal
        } else {
            DragRegime::Minimal
        }
    }

    /// Piecewise score, continuous across band boundaries.
    fn score(&self, ratio: f64, regime: DragRegime) -> f64 {
        match regime {
            DragRegime::Minimal => band_score(ratio, 0.0, self.normal_threshold, 0.0, 50.0),
            DragRegime::Normal => {
                band_score(ratio, self.normal_threshold, self.elevated_threshold, 50.0, 75.0)
            }
            DragRegime::Elevated => {
                band_score(ratio, self.elevated_threshold, self.stress_threshold, 75.0, 90.0)
            }
            DragRegime::Stress => band_score(ratio, self.stress_threshold, 1.0, 90.0, 100.0),
        }
    }
}

impl Validate for TgaDragConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.normal_threshold <= 0.0 {
            errors.push(ValidationError::new("normal_threshold", "must be positive"));
        }
        check_ascending(
            &mut errors,
            "normal_threshold",
            self.normal_threshold,
            "elevated_threshold",
            self.elevated_threshold,
        );
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

/// TGA drag at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TgaDragReading {
    /// Treasury General Account balance.
    pub tga: f64,
    /// Reserve balances.
    pub reserves: f64,
    /// `TGA / (TGA + Reserves)`.
    pub ratio: f64,
    /// Drag band.
    pub regime: DragRegime,
    /// Drag score, 0-100.
    pub score: f64,
    /// `reserves × (1 - ratio)`.
    pub effective_reserves: f64,
}

/// Measures fiscal drag. Zero total liquidity is insufficient data.
pub fn tga_drag_reading(tga: f64, reserves: f64, config: &TgaDragConfig) -> Classified<TgaDragReading> {
    let total = tga + reserves;
    if !all_finite(&[tga, reserves]) || total == 0.0 {
        return Classified::InsufficientData;
    }

    let ratio = tga / total;
    let regime = config.classify(ratio);
    Classified::Level(TgaDragReading {
        tga,
        reserves,
        ratio,
        regime,
        score: config.score(ratio, regime),
        effective_reserves: reserves * (1.0 - ratio),
    })
}

/// TGA drag at every timestamp of two aligned series.
pub fn tga_drag(
    tga: &DatedSeries,
    reserves: &DatedSeries,
    config: &TgaDragConfig,
) -> ReservoirResult<ReadingSeries<TgaDragReading>> {
    tga.ensure_aligned(reserves)?;
    Ok(readings(tga, |t| match (tga.value(t), reserves.value(t)) {
        (Some(tga), Some(reserves)) => tga_drag_reading(tga, reserves, config),
        _ => Classified::InsufficientData,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bands_are_lower_closed() {
        let config = TgaDragConfig::default();
        assert_eq!(config.classify(0.049), DragRegime::Minimal);
        assert_eq!(config.classify(0.05), DragRegime::Normal);
        assert_eq!(config.classify(0.15), DragRegime::Elevated);
        assert_eq!(config.classify(0.25), DragRegime::Stress);
    }

    #[test]
    fn test_reading() {
        // 750 / (750 + 3250) = 0.1875
        let reading = tga_drag_reading(750.0, 3250.0, &TgaDragConfig::default())
            .into_level()
            .unwrap();
        assert_relative_eq!(reading.ratio, 0.1875);
        assert_eq!(reading.regime, DragRegime::Elevated);
        assert_relative_eq!(reading.score, 75.0 + 0.375 * 15.0, epsilon = 1e-9);
        assert_relative_eq!(reading.effective_reserves, 3250.0 * 0.8125);
    }

    #[test]
    fn test_score_is_continuous() {
        let config = TgaDragConfig::default();
        let score = |r: f64| config.score(r, config.classify(r));
        assert_relative_eq!(score(0.05 - 1e-12), score(0.05), epsilon = 1e-6);
        assert_relative_eq!(score(0.25 - 1e-12), score(0.25), epsilon = 1e-6);
        assert_relative_eq!(score(1.0), 100.0);
    }

    #[test]
    fn test_zero_total_is_insufficient() {
        assert!(tga_drag_reading(0.0, 0.0, &TgaDragConfig::default()).is_insufficient());
    }
}
