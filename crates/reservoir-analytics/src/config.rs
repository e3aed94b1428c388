//! Engine configuration.
//!
//! Thresholds, weights and alert rules are plain data. Every section has
//! documented defaults and `#[serde(default)]`, so a JSON or YAML file only
//! needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::alerts::{default_rules, AlertRule, SignalConfig};
use crate::error::{Validate, ValidationError};
use crate::metrics::{
    DemandProxyConfig, IdentityConfig, LendingStressConfig, MoneyMarketConfig, QtPaceConfig,
    ReserveRegimeConfig, TgaDragConfig,
};
use crate::regime::{FactorConfig, RegimeConfig};

/// Controls optional parallel evaluation.
///
/// Results are identical whether or not evaluation runs in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Enable parallel processing (requires 'parallel' feature).
    pub parallel: bool,

    /// Minimum item count to trigger parallel processing.
    /// Below this threshold, sequential is faster due to thread overhead.
    pub parallel_threshold: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 100,
        }
    }
}

impl EvaluationConfig {
    /// Creates a config that always uses sequential processing.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parallel evaluation settings.
    pub evaluation: EvaluationConfig,
    /// QT pace.
    pub qt_pace: QtPaceConfig,
    /// Reserve regime bands.
    pub reserve_regime: ReserveRegimeConfig,
    /// Balance-sheet identity tolerance.
    pub identity: IdentityConfig,
    /// Money-market stress scoring.
    pub money_market: MoneyMarketConfig,
    /// Fed lending stress bands.
    pub lending_stress: LendingStressConfig,
    /// TGA drag bands.
    pub tga_drag: TgaDragConfig,
    /// Reserve demand proxy bands.
    pub demand_proxy: DemandProxyConfig,
    /// Regime weights and bands.
    pub regime: RegimeConfig,
    /// Factor score construction.
    pub factors: FactorConfig,
    /// Alert signal construction.
    pub signals: SignalConfig,
    /// Alert rules, evaluated in order.
    pub alert_rules: Vec<AlertRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluation: EvaluationConfig::default(),
            qt_pace: QtPaceConfig::default(),
            reserve_regime: ReserveRegimeConfig::default(),
            identity: IdentityConfig::default(),
            money_market: MoneyMarketConfig::default(),
            lending_stress: LendingStressConfig::default(),
            tga_drag: TgaDragConfig::default(),
            demand_proxy: DemandProxyConfig::default(),
            regime: RegimeConfig::default(),
            factors: FactorConfig::default(),
            signals: SignalConfig::default(),
            alert_rules: default_rules(),
        }
    }
}

impl EngineConfig {
    /// Sets the evaluation settings.
    #[must_use]
    pub fn with_evaluation(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Sets the regime settings.
    #[must_use]
    pub fn with_regime(mut self, regime: RegimeConfig) -> Self {
        self.regime = regime;
        self
    }

    /// Replaces the alert rules.
    #[must_use]
    pub fn with_alert_rules(mut self, rules: Vec<AlertRule>) -> Self {
        self.alert_rules = rules;
        self
    }
}

fn nest(errors: &mut Vec<ValidationError>, prefix: &str, section: &impl Validate) {
    errors.extend(section.validate().into_iter().map(|e| e.nested(prefix)));
}

impl Validate for EngineConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        nest(&mut errors, "qt_pace", &self.qt_pace);
        nest(&mut errors, "reserve_regime", &self.reserve_regime);
        nest(&mut errors, "identity", &self.identity);
        nest(&mut errors, "money_market", &self.money_market);
        nest(&mut errors, "lending_stress", &self.lending_stress);
        nest(&mut errors, "tga_drag", &self.tga_drag);
        nest(&mut errors, "demand_proxy", &self.demand_proxy);
        nest(&mut errors, "regime", &self.regime);
        nest(&mut errors, "factors", &self.factors);
        nest(&mut errors, "signals", &self.signals);

        let mut seen = BTreeSet::new();
        for rule in &self.alert_rules {
            let prefix = format!("alert_rules.{}", rule.id);
            if !seen.insert(rule.id.as_str()) {
                errors.push(ValidationError::with_rule(
                    prefix.clone(),
                    "duplicate rule id",
                    "unique_rule_id",
                ));
            }
            nest(&mut errors, &prefix, rule);
        }
        errors
    }
}
