//! Evaluates a rule set against a signal snapshot.

use std::collections::HashSet;

use super::{default_rules, Alert, AlertRule, RuleOutcome, SignalSnapshot};
use crate::config::EvaluationConfig;
use crate::error::{AnalyticsError, AnalyticsResult, Validate};
use crate::parallel::maybe_parallel_filter_map;

/// A validated, ordered set of alert rules.
///
/// # Example
///
/// ```rust
/// use reservoir_analytics::alerts::{AlertEngine, Signal, SignalSnapshot};
///
/// let engine = AlertEngine::with_default_rules();
/// let snapshot = SignalSnapshot::new()
///     .with(Signal::VolatilityPercentile, 95.0)
///     .with(Signal::SpreadPercentile, 80.0)
///     .with(Signal::EquityReturn1mPct, -7.0);
///
/// let alerts = engine.evaluate(&snapshot);
/// assert_eq!(alerts.len(), 1);
/// assert_eq!(alerts[0].rule_id, "collateral_stress");
/// ```
#[derive(Debug, Clone)]
pub struct AlertEngine {
    rules: Vec<AlertRule>,
    evaluation: EvaluationConfig,
}

impl AlertEngine {
    /// Creates an engine, rejecting duplicate ids and malformed rules.
    pub fn new(rules: Vec<AlertRule>) -> AnalyticsResult<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(AnalyticsError::DuplicateRule {
                    id: rule.id.clone(),
                });
            }
            if let Some(error) = rule.validate().into_iter().next() {
                return Err(AnalyticsError::invalid_rule(&rule.id, error.to_string()));
            }
        }
        Ok(Self {
            rules,
            evaluation: EvaluationConfig::default(),
        })
    }

    /// Engine over the three canonical rules.
    #[must_use]
    pub fn with_default_rules() -> Self {
        Self {
            rules: default_rules(),
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Sets the parallel evaluation policy.
    #[must_use]
    pub fn with_evaluation(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// The rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Returns the alerts that fire, in rule order.
    ///
    /// Rules whose inputs are missing are skipped, never fired.
    #[must_use]
    pub fn evaluate(&self, snapshot: &SignalSnapshot) -> Vec<Alert> {
        maybe_parallel_filter_map(&self.rules, &self.evaluation, |rule| {
            match rule.evaluate(snapshot) {
                RuleOutcome::Fired(alert) => Some(alert),
                RuleOutcome::Quiet => None,
                RuleOutcome::Skipped => {
                    log::debug!("alert rule '{}' skipped: missing signals", rule.id);
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Condition, Severity, Signal};

    #[test]
    fn test_duplicate_rule_rejected() {
        let rule = AlertRule::new(
            "spread_widening",
            "Spread widening",
            Severity::Watch,
            Condition::above(Signal::SpreadChange, 0.5),
        );
        let err = AlertEngine::new(vec![rule.clone(), rule]).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::DuplicateRule {
                id: "spread_widening".into()
            }
        );
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let rule = AlertRule::new("", "Untitled", Severity::Watch, Condition::any([]));
        assert!(matches!(
            AlertEngine::new(vec![rule]),
            Err(AnalyticsError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_empty_snapshot_fires_nothing() {
        let engine = AlertEngine::with_default_rules();
        assert!(engine.evaluate(&SignalSnapshot::new()).is_empty());
    }

    #[test]
    fn test_alerts_in_rule_order() {
        let engine = AlertEngine::with_default_rules()
            .with_evaluation(EvaluationConfig::default().with_threshold(1));
        let snapshot = SignalSnapshot::new()
            .with(Signal::VolatilityPercentile, 95.0)
            .with(Signal::SpreadPercentile, 80.0)
            .with(Signal::EquityReturn1mPct, -7.0)
            .with(Signal::CreditGrowthAnnualizedPct, -1.5)
            .with(Signal::SpreadChange, 0.4);

        let ids: Vec<_> = engine
            .evaluate(&snapshot)
            .into_iter()
            .map(|a| a.rule_id)
            .collect();
        assert_eq!(ids, vec!["collateral_stress", "balance_sheet_contraction"]);
    }
}
