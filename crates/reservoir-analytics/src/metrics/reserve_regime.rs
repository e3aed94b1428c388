//! Reserve regime: reserve balances banded Scarce / Tight / Ample / Abundant.

use serde::{Deserialize, Serialize};
use std::fmt;

use reservoir_core::{Classified, DatedSeries, ReservoirResult};

use super::{readings, ReadingSeries};
use crate::error::{check_ascending, check_range, Validate, ValidationError};

/// Reserve abundance band, ordered from scarcest to most abundant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReserveRegime {
    /// Reserves at or below the tight threshold
    Scarce,
    /// Funding pressure likely
    Tight,
    /// Comfortable operating level
    Ample,
    /// Excess liquidity
    Abundant,
}

impl ReserveRegime {
    /// Short interpretation of the band.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            ReserveRegime::Abundant => "Excess liquidity, QT has room to run",
            ReserveRegime::Ample => "Comfortable, monitor for transition",
            ReserveRegime::Tight => "Funding pressure likely, QT should slow",
            ReserveRegime::Scarce => "Crisis territory, expect Fed intervention",
        }
    }
}

impl fmt::Display for ReserveRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReserveRegime::Scarce => "Scarce",
            ReserveRegime::Tight => "Tight",
            ReserveRegime::Ample => "Ample",
            ReserveRegime::Abundant => "Abundant",
        };
        write!(f, "{name}")
    }
}

/// Band thresholds in billions. A level equal to a threshold takes the lower band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveRegimeConfig {
    /// Above this level reserves are Abundant.
    pub abundant_threshold: f64,
    /// Above this level reserves are Ample.
    pub ample_threshold: f64,
    /// Above this level reserves are Tight; at or below, Scarce.
    pub tight_threshold: f64,
    /// Share of the RRP balance netted out of reserves when RRP is supplied.
    pub rrp_weight: f64,
}

impl Default for ReserveRegimeConfig {
    fn default() -> Self {
        Self {
            abundant_threshold: 2500.0,
            ample_threshold: 1500.0,
            tight_threshold: 500.0,
            rrp_weight: 0.1,
        }
    }
}

impl ReserveRegimeConfig {
    /// Sets the three band thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, abundant: f64, ample: f64, tight: f64) -> Self {
        self.abundant_threshold = abundant;
        self.ample_threshold = ample;
        self.tight_threshold = tight;
        self
    }

    /// Sets the RRP netting weight.
    #[must_use]
    pub fn with_rrp_weight(mut self, weight: f64) -> Self {
        self.rrp_weight = weight;
        self
    }
}

impl Validate for ReserveRegimeConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_ascending(
            &mut errors,
            "tight_threshold",
            self.tight_threshold,
            "ample_threshold",
            self.ample_threshold,
        );
        check_ascending(
            &mut errors,
            "ample_threshold",
            self.ample_threshold,
            "abundant_threshold",
            self.abundant_threshold,
        );
        check_range(&mut errors, "rrp_weight", self.rrp_weight, 0.0, 1.0);
        errors
    }
}

/// Bands a reserve level. Non-increasing in abundance as the level falls.
#[must_use]
pub fn classify_reserves(level: f64, config: &ReserveRegimeConfig) -> ReserveRegime {
    if level > config.abundant_threshold {
        ReserveRegime::Abundant
    } else if level > config.ample_threshold {
        ReserveRegime::Ample
    } else if level > config.tight_threshold {
        ReserveRegime::Tight
    } else {
        ReserveRegime::Scarce
    }
}

/// Reserve regime at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReserveRegimeReading {
    /// Reported reserve balances.
    pub reserves: f64,
    /// RRP balance, if it was netted.
    pub reverse_repo: Option<f64>,
    /// Level that was classified.
    pub effective_reserves: f64,
    /// Band of the effective level.
    pub regime: ReserveRegime,
}

/// Classifies reserves, optionally net of a share of the RRP balance.
pub fn reserve_regime_reading(
    reserves: f64,
    reverse_repo: Option<f64>,
    config: &ReserveRegimeConfig,
) -> Classified<ReserveRegimeReading> {
    if !reserves.is_finite() || reverse_repo.is_some_and(|rrp| !rrp.is_finite()) {
        return Classified::InsufficientData;
    }

    let effective_reserves = reverse_repo.map_or(reserves, |rrp| reserves - config.rrp_weight * rrp);
    Classified::Level(ReserveRegimeReading {
        reserves,
        reverse_repo,
        effective_reserves,
        regime: classify_reserves(effective_reserves, config),
    })
}

/// Reserve regime at every timestamp.
///
/// When `reverse_repo` is given it must share the reserves timestamps, and a
/// missing RRP value makes that timestamp insufficient.
pub fn reserve_regime(
    reserves: &DatedSeries,
    reverse_repo: Option<&DatedSeries>,
    config: &ReserveRegimeConfig,
) -> ReservoirResult<ReadingSeries<ReserveRegimeReading>> {
    if let Some(rrp) = reverse_repo {
        reserves.ensure_aligned(rrp)?;
    }

    Ok(readings(reserves, |t| {
        let Some(level) = reserves.value(t) else {
            return Classified::InsufficientData;
        };
        match reverse_repo {
            Some(rrp) => match rrp.value(t) {
                Some(rrp) => reserve_regime_reading(level, Some(rrp), config),
                None => Classified::InsufficientData,
            },
            None => reserve_regime_reading(level, None, config),
        }
    }))
}
