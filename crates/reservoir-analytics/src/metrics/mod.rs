//! Balance-sheet and liquidity stress metrics.
//!
//! Seven independently callable metrics. Each offers a scalar `*_reading`
//! function over already-aligned latest inputs and a series function that
//! evaluates the reading at every timestamp. All amounts are billions of USD.
//!
//! - [`qt_pace`]: month-over-month change in Fed total assets
//! - [`reserve_regime`]: reserve level banded Scarce / Tight / Ample / Abundant
//! - [`identity`]: reserve balance-sheet identity residual
//! - [`money_market`]: reverse-repo level and acceleration stress score
//! - [`lending`]: Fed lending facility stress via trailing percentile
//! - [`tga_drag`]: TGA share of overnight liquidity
//! - [`demand_proxy`]: RRP share of overnight liquidity
//!
//! Missing inputs never produce numeric defaults: the reading is
//! [`Classified::InsufficientData`].

pub mod dashboard;
pub mod demand_proxy;
pub mod identity;
pub mod lending;
pub mod money_market;
pub mod qt_pace;
pub mod reserve_regime;
pub mod tga_drag;

use serde::{Deserialize, Serialize};
use std::fmt;

use reservoir_core::{Classified, DatedSeries, Observation};

pub use dashboard::{BalanceSheetDashboard, BalanceSheetInputs};
pub use demand_proxy::{demand_proxy, demand_proxy_reading, DemandProxyConfig, DemandProxyReading};
pub use identity::{
    identity_reading, verify_identity, IdentityConfig, IdentityDeltas, IdentityInputs,
    IdentityReading,
};
pub use lending::{lending_stress, lending_stress_reading, LendingStressConfig, LendingStressReading};
pub use money_market::{
    money_market_reading, money_market_stress, MoneyMarketConfig, MoneyMarketReading,
};
pub use qt_pace::{qt_pace, qt_pace_reading, BalanceSheetPhase, QtPaceConfig, QtPaceReading};
pub use reserve_regime::{
    classify_reserves, reserve_regime, reserve_regime_reading, ReserveRegime, ReserveRegimeConfig,
    ReserveRegimeReading,
};
pub use tga_drag::{tga_drag, tga_drag_reading, DragRegime, TgaDragConfig, TgaDragReading};

/// A reading evaluated at every timestamp of the input series.
pub type ReadingSeries<R> = Vec<Observation<Classified<R>>>;

/// Three-level stress classification shared by several metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StressLevel {
    /// No stress signal
    Normal,
    /// Heightened, worth watching
    Elevated,
    /// Acute stress
    Stress,
}

impl StressLevel {
    /// Bands a 0-100 score: below `elevated` is Normal, below `stress` Elevated.
    #[must_use]
    pub fn from_score(score: f64, elevated: f64, stress: f64) -> Self {
        if score >= stress {
            StressLevel::Stress
        } else if score >= elevated {
            StressLevel::Elevated
        } else {
            StressLevel::Normal
        }
    }

    /// The next more severe level, capped at Stress.
    #[must_use]
    pub fn escalate(self) -> Self {
        match self {
            StressLevel::Normal => StressLevel::Elevated,
            StressLevel::Elevated | StressLevel::Stress => StressLevel::Stress,
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StressLevel::Normal => "Normal",
            StressLevel::Elevated => "Elevated",
            StressLevel::Stress => "Stress",
        };
        write!(f, "{name}")
    }
}

/// Clamps a score to [0, 100].
pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Maps `value` linearly from `[lo, hi]` onto `[score_lo, score_hi]`, clamped.
pub(crate) fn band_score(value: f64, lo: f64, hi: f64, score_lo: f64, score_hi: f64) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return score_lo;
    }
    (score_lo + (value - lo) / span * (score_hi - score_lo)).clamp(score_lo, score_hi)
}

/// Returns true if every listed input is finite.
pub(crate) fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Evaluates `f` at every timestamp of `series`, passing the value index.
pub(crate) fn readings<R, F>(series: &DatedSeries, f: F) -> ReadingSeries<R>
where
    F: Fn(usize) -> Classified<R>,
{
    series
        .dates()
        .iter()
        .enumerate()
        .map(|(t, date)| Observation::new(*date, f(t)))
        .collect()
}
