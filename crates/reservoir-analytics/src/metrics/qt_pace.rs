//! QT pace: month-over-month change in Fed total assets.

use serde::{Deserialize, Serialize};
use std::fmt;

use reservoir_core::{Classified, DatedSeries, Frequency, ReservoirResult};

use super::{all_finite, readings, ReadingSeries};
use crate::error::{check_finite, Validate, ValidationError};

/// Direction of the central bank balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceSheetPhase {
    /// Assets growing (QE)
    Expansion,
    /// Change within the flat band
    Flat,
    /// Assets shrinking (QT)
    Contraction,
}

impl fmt::Display for BalanceSheetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BalanceSheetPhase::Expansion => "Expansion",
            BalanceSheetPhase::Flat => "Flat",
            BalanceSheetPhase::Contraction => "Contraction",
        };
        write!(f, "{name}")
    }
}

/// QT pace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtPaceConfig {
    /// Absolute monthly % change at or below which the phase is Flat.
    pub flat_band_pct: f64,
}

impl Default for QtPaceConfig {
    fn default() -> Self {
        Self { flat_band_pct: 0.0 }
    }
}

impl QtPaceConfig {
    /// Sets the flat band.
    #[must_use]
    pub fn with_flat_band_pct(mut self, band: f64) -> Self {
        self.flat_band_pct = band;
        self
    }
}

impl Validate for QtPaceConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_finite(&mut errors, "flat_band_pct", self.flat_band_pct);
        if self.flat_band_pct < 0.0 {
            errors.push(ValidationError::new("flat_band_pct", "must not be negative"));
        }
        errors
    }
}

/// QT pace at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QtPaceReading {
    /// Monthly change in percent.
    pub pace_pct: f64,
    /// Change in billions.
    pub change: f64,
    /// Current total assets.
    pub current_assets: f64,
    /// Total assets one month earlier.
    pub prior_assets: f64,
    /// Expansion, flat or contraction.
    pub phase: BalanceSheetPhase,
}

/// Computes the QT pace from current and month-earlier total assets.
pub fn qt_pace_reading(
    current_assets: f64,
    prior_assets: f64,
    config: &QtPaceConfig,
) -> Classified<QtPaceReading> {
    if !all_finite(&[current_assets, prior_assets]) || prior_assets == 0.0 {
        return Classified::InsufficientData;
    }

    let pace_pct = (current_assets / prior_assets - 1.0) * 100.0;
    let phase = if pace_pct > config.flat_band_pct {
        BalanceSheetPhase::Expansion
    } else if pace_pct < -config.flat_band_pct {
        BalanceSheetPhase::Contraction
    } else {
        BalanceSheetPhase::Flat
    };

    Classified::Level(QtPaceReading {
        pace_pct,
        change: current_assets - prior_assets,
        current_assets,
        prior_assets,
        phase,
    })
}

/// QT pace at every timestamp, comparing with the value one month earlier.
pub fn qt_pace(
    fed_assets: &DatedSeries,
    frequency: Frequency,
    config: &QtPaceConfig,
) -> ReservoirResult<ReadingSeries<QtPaceReading>> {
    let lag = frequency.periods_per_month();
    Ok(readings(fed_assets, |t| {
        let current = fed_assets.value(t);
        let prior = t.checked_sub(lag).and_then(|i| fed_assets.value(i));
        match (current, prior) {
            (Some(current), Some(prior)) => qt_pace_reading(current, prior, config),
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
    fn test_qt_pace_decline() {
        let reading = qt_pace_reading(8400.0, 8500.0, &QtPaceConfig::default())
            .into_level()
            .unwrap();
        assert_relative_eq!(reading.pace_pct, -1.176_470_588_235_294, epsilon = 1e-9);
        assert_relative_eq!(reading.change, -100.0);
        assert_eq!(reading.phase, BalanceSheetPhase::Contraction);
    }

    #[test]
    fn test_flat_band() {
        let config = QtPaceConfig::default().with_flat_band_pct(0.5);
        let reading = qt_pace_reading(8520.0, 8500.0, &config).into_level().unwrap();
        assert_eq!(reading.phase, BalanceSheetPhase::Flat);

        let reading = qt_pace_reading(8600.0, 8500.0, &config).into_level().unwrap();
        assert_eq!(reading.phase, BalanceSheetPhase::Expansion);
    }

    #[test]
    fn test_zero_prior_is_insufficient() {
        assert!(qt_pace_reading(1.0, 0.0, &QtPaceConfig::default()).is_insufficient());
    }

    #[test]
    fn test_weekly_series() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let assets = DatedSeries::from_observations(
            "walcl",
            (0..6).map(|i| {
                let value = if i == 4 { None } else { Some(8500.0 - 20.0 * f64::from(i)) };
                (start + chrono::Duration::weeks(i64::from(i)), value)
            }),
        )
        .unwrap();

        let pace = qt_pace(&assets, Frequency::Weekly, &QtPaceConfig::default()).unwrap();
        assert_eq!(pace.len(), 6);
        assert!(pace[3].value.is_insufficient());
        assert!(pace[4].value.is_insufficient());
        let latest = pace[5].value.level().unwrap();
        assert_relative_eq!(latest.prior_assets, 8480.0);
        assert_eq!(latest.phase, BalanceSheetPhase::Contraction);
    }

    #[test]
    fn test_negative_band_rejected() {
        assert!(!QtPaceConfig::default().with_flat_band_pct(-1.0).is_valid());
    }
}
