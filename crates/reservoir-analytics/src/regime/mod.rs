//! Weighted, explainable macro regime classification.
//!
//! Five risk-oriented factor scores (0 benign, 100 stressed) are combined
//! into a composite that is banded into one of four regimes. Each call
//! classifies a single snapshot; regime transitions are only visible by
//! comparing successive results.

mod classifier;
mod factors;

pub use classifier::{
    FactorContribution, FactorObservation, FactorScores, RegimeClassification, RegimeClassifier,
};
pub use factors::{FactorBuilder, FactorConfig, FactorInputs, SeriesInput};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{check_ascending, check_finite, check_range, Validate, ValidationError};

/// Macro liquidity regime, ordered from benign to acute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MacroRegime {
    /// Credit and balance sheets expanding, spreads tight, volatility calm
    Expansion,
    /// Credit still growing but valuations outrunning earnings
    LateCycle,
    /// Credit slowing, spreads widening, volatility rising
    Contraction,
    /// Volatility spike, spread blowout, risk assets falling
    Stress,
}

impl MacroRegime {
    /// One-line description of the regime.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            MacroRegime::Expansion => {
                "Credit and balance sheets expanding, spreads tightening, volatility stable: risk-on"
            }
            MacroRegime::LateCycle => {
                "Credit still growing but valuations outpacing earnings: watch for belief overheating"
            }
            MacroRegime::Contraction => {
                "Credit growth slowing or reversing, spreads widening, volatility rising: balance sheets shrinking"
            }
            MacroRegime::Stress => {
                "Volatility spike with spread blowout and falling risk assets: collateral impairment, credit crunch risk"
            }
        }
    }

    /// Where the regime is most likely to break.
    #[must_use]
    pub fn vulnerable_path(self) -> &'static str {
        match self {
            MacroRegime::Expansion => "credit over-extension, monitor balance-sheet growth",
            MacroRegime::LateCycle => "valuations running ahead of earnings, belief overheating",
            MacroRegime::Contraction => {
                "spread widening -> collateral impairment -> forced selling"
            }
            MacroRegime::Stress => "leveraged position unwinds and a liquidity crunch",
        }
    }
}

impl fmt::Display for MacroRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MacroRegime::Expansion => "Expansion",
            MacroRegime::LateCycle => "Late-cycle",
            MacroRegime::Contraction => "Contraction",
            MacroRegime::Stress => "Stress",
        };
        write!(f, "{name}")
    }
}

/// A regime factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// Credit growth (high growth scores low)
    CreditGrowth,
    /// Credit spread level (wide spreads score high)
    SpreadTightness,
    /// Implied volatility
    Volatility,
    /// Valuation running ahead of earnings
    ValuationGap,
    /// Real yield level
    RealYield,
}

impl Factor {
    /// Every factor, in weight order.
    pub const ALL: [Factor; 5] = [
        Factor::CreditGrowth,
        Factor::SpreadTightness,
        Factor::Volatility,
        Factor::ValuationGap,
        Factor::RealYield,
    ];

    /// Stable key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Factor::CreditGrowth => "credit_growth",
            Factor::SpreadTightness => "spread_tightness",
            Factor::Volatility => "volatility",
            Factor::ValuationGap => "valuation_gap",
            Factor::RealYield => "real_yield",
        }
    }

    /// Catalog key of the indicator whose orientation the score follows.
    #[must_use]
    pub fn indicator(self) -> Option<&'static str> {
        match self {
            Factor::CreditGrowth => Some("bank_credit"),
            Factor::SpreadTightness => Some("hy_spread"),
            Factor::Volatility => Some("vix"),
            Factor::ValuationGap => None,
            Factor::RealYield => Some("real_yield_10y"),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Factor::CreditGrowth => "Credit growth",
            Factor::SpreadTightness => "Spread tightness",
            Factor::Volatility => "Volatility",
            Factor::ValuationGap => "Valuation vs earnings",
            Factor::RealYield => "Real yield",
        };
        write!(f, "{name}")
    }
}

/// Factor weights. Must be non-negative and sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    /// Credit growth weight
    pub credit_growth: f64,
    /// Spread weight
    pub spread_tightness: f64,
    /// Volatility weight
    pub volatility: f64,
    /// Valuation gap weight
    pub valuation_gap: f64,
    /// Real yield weight
    pub real_yield: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            credit_growth: 0.25,
            spread_tightness: 0.25,
            volatility: 0.20,
            valuation_gap: 0.15,
            real_yield: 0.15,
        }
    }
}

impl FactorWeights {
    /// Weight of one factor.
    #[must_use]
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::CreditGrowth => self.credit_growth,
            Factor::SpreadTightness => self.spread_tightness,
            Factor::Volatility => self.volatility,
            Factor::ValuationGap => self.valuation_gap,
            Factor::RealYield => self.real_yield,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

/// Tolerance on the weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

impl Validate for FactorWeights {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for factor in Factor::ALL {
            let weight = self.get(factor);
            check_finite(&mut errors, factor.key(), weight);
            if weight < 0.0 {
                errors.push(ValidationError::with_rule(
                    factor.key(),
                    "weight must not be negative",
                    "non_negative_weight",
                ));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            errors.push(ValidationError::with_rule(
                "total",
                format!("weights sum to {total}, expected 1"),
                "weights_sum_to_one",
            ));
        }
        errors
    }
}

/// Classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Factor weights.
    pub weights: FactorWeights,
    /// Composite below this is Expansion.
    pub expansion_ceiling: f64,
    /// Composite below this (and not Expansion) is Late-cycle.
    pub late_cycle_ceiling: f64,
    /// Composite below this (and not Late-cycle) is Contraction; at or above, Stress.
    pub contraction_ceiling: f64,
    /// Volatility score at or above which the regime is forced to Stress.
    pub volatility_veto: f64,
    /// Minimum number of present factors.
    pub min_factors: usize,
    /// Confidence below which a result is flagged for caution.
    pub low_confidence_threshold: f64,
    /// Days a factor may lag the newest factor before it is reported stale.
    pub max_staleness_days: i64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            expansion_ceiling: 35.0,
            late_cycle_ceiling: 55.0,
            contraction_ceiling: 75.0,
            volatility_veto: 90.0,
            min_factors: 3,
            low_confidence_threshold: 0.7,
            max_staleness_days: 7,
        }
    }
}

impl RegimeConfig {
    /// Sets the factor weights.
    #[must_use]
    pub fn with_weights(mut self, weights: FactorWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the volatility veto threshold.
    #[must_use]
    pub fn with_volatility_veto(mut self, threshold: f64) -> Self {
        self.volatility_veto = threshold;
        self
    }

    /// Sets the minimum number of present factors.
    #[must_use]
    pub fn with_min_factors(mut self, min_factors: usize) -> Self {
        self.min_factors = min_factors;
        self
    }

    /// Bands a composite score.
    #[must_use]
    pub fn band(&self, composite: f64) -> MacroRegime {
        if composite < self.expansion_ceiling {
            MacroRegime::Expansion
        } else if composite < self.late_cycle_ceiling {
            MacroRegime::LateCycle
        } else if composite < self.contraction_ceiling {
            MacroRegime::Contraction
        } else {
            MacroRegime::Stress
        }
    }
}

impl Validate for RegimeConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .weights
            .validate()
            .into_iter()
            .map(|e| e.nested("weights"))
            .collect();

        check_ascending(
            &mut errors,
            "expansion_ceiling",
            self.expansion_ceiling,
            "late_cycle_ceiling",
            self.late_cycle_ceiling,
        );
        check_ascending(
            &mut errors,
            "late_cycle_ceiling",
            self.late_cycle_ceiling,
            "contraction_ceiling",
            self.contraction_ceiling,
        );
        check_range(&mut errors, "expansion_ceiling", self.expansion_ceiling, 0.0, 100.0);
        check_range(&mut errors, "contraction_ceiling", self.contraction_ceiling, 0.0, 100.0);
        check_range(&mut errors, "volatility_veto", self.volatility_veto, 0.0, 100.0);
        check_range(
            &mut errors,
            "low_confidence_threshold",
            self.low_confidence_threshold,
            0.0,
            1.0,
        );
        if self.min_factors == 0 || self.min_factors > Factor::ALL.len() {
            errors.push(ValidationError::new(
                "min_factors",
                format!("must lie in 1..={}", Factor::ALL.len()),
            ));
        }
        if self.max_staleness_days < 0 {
            errors.push(ValidationError::new("max_staleness_days", "must not be negative"));
        }
        errors
    }
}
