//! Alert rules: a predicate over signals plus descriptive metadata.
//!
//! Conditions form a small expression tree that serializes as tagged data,
//! so rules can be written in a config file:
//!
//! ```yaml
//! condition:
//!   type: all
//!   conditions:
//!     - { type: above, signal: volatility_percentile, threshold: 90 }
//!     - { type: below, signal: equity_return_1m_pct, threshold: -5 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Alert, Severity, Signal, SignalSnapshot};
use crate::error::{check_finite, Validate, ValidationError};

/// A boolean predicate over signals.
///
/// Evaluation is three-valued: `None` means a required signal is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `signal > threshold`
    Above {
        /// Signal to test.
        signal: Signal,
        /// Exclusive lower bound.
        threshold: f64,
    },
    /// `signal < threshold`
    Below {
        /// Signal to test.
        signal: Signal,
        /// Exclusive upper bound.
        threshold: f64,
    },
    /// `lhs - rhs > margin`
    GapAbove {
        /// Minuend.
        lhs: Signal,
        /// Subtrahend.
        rhs: Signal,
        /// Exclusive lower bound on the gap.
        margin: f64,
    },
    /// Every branch holds. Missing if any branch is missing.
    All {
        /// Branches.
        conditions: Vec<Condition>,
    },
    /// Some present branch holds.
    Any {
        /// Branches.
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// `signal > threshold`.
    #[must_use]
    pub fn above(signal: Signal, threshold: f64) -> Self {
        Condition::Above { signal, threshold }
    }

    /// `signal < threshold`.
    #[must_use]
    pub fn below(signal: Signal, threshold: f64) -> Self {
        Condition::Below { signal, threshold }
    }

    /// `lhs - rhs > margin`.
    #[must_use]
    pub fn gap_above(lhs: Signal, rhs: Signal, margin: f64) -> Self {
        Condition::GapAbove { lhs, rhs, margin }
    }

    /// Conjunction.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::All {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Disjunction.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Any {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Evaluates against a snapshot; `None` if a required signal is missing.
    #[must_use]
    pub fn evaluate(&self, snapshot: &SignalSnapshot) -> Option<bool> {
        match self {
            Condition::Above { signal, threshold } => snapshot.get(*signal).map(|v| v > *threshold),
            Condition::Below { signal, threshold } => snapshot.get(*signal).map(|v| v < *threshold),
            Condition::GapAbove { lhs, rhs, margin } => {
                Some(snapshot.get(*lhs)? - snapshot.get(*rhs)? > *margin)
            }
            Condition::All { conditions } => conditions
                .iter()
                .map(|c| c.evaluate(snapshot))
                .collect::<Option<Vec<bool>>>()
                .map(|results| results.into_iter().all(|r| r)),
            Condition::Any { conditions } => {
                let results: Vec<Option<bool>> =
                    conditions.iter().map(|c| c.evaluate(snapshot)).collect();
                if results.contains(&Some(true)) {
                    Some(true)
                } else if results.iter().all(Option::is_some) {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    /// Every signal the condition reads, without duplicates.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal> {
        let mut signals = Vec::new();
        self.collect_signals(&mut signals);
        signals.sort();
        signals.dedup();
        signals
    }

    fn collect_signals(&self, out: &mut Vec<Signal>) {
        match self {
            Condition::Above { signal, .. } | Condition::Below { signal, .. } => out.push(*signal),
            Condition::GapAbove { lhs, rhs, .. } => out.extend([*lhs, *rhs]),
            Condition::All { conditions } | Condition::Any { conditions } => {
                for condition in conditions {
                    condition.collect_signals(out);
                }
            }
        }
    }
}

impl Validate for Condition {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            Condition::Above { threshold, .. } | Condition::Below { threshold, .. } => {
                check_finite(&mut errors, "threshold", *threshold);
            }
            Condition::GapAbove { margin, .. } => check_finite(&mut errors, "margin", *margin),
            Condition::All { conditions } | Condition::Any { conditions } => {
                if conditions.is_empty() {
                    errors.push(ValidationError::new("conditions", "must not be empty"));
                }
                for (i, condition) in conditions.iter().enumerate() {
                    let prefix = format!("conditions[{i}]");
                    errors.extend(condition.validate().into_iter().map(|e| e.nested(&prefix)));
                }
            }
        }
        errors
    }
}

/// Raises a rule's severity when a stronger condition also holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Severity when escalated.
    pub severity: Severity,
    /// Condition that must also hold.
    pub condition: Condition,
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The rule fired.
    Fired(Alert),
    /// All inputs present, condition false.
    Quiet,
    /// A required signal is missing.
    Skipped,
}

/// A configured alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique rule id.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Severity when the condition holds.
    pub severity: Severity,
    /// Firing condition.
    pub condition: Condition,
    /// Optional severity escalation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<Escalation>,
    /// Description with `{signal_key}` placeholders.
    #[serde(default)]
    pub description_template: String,
    /// How the vulnerability would propagate.
    #[serde(default)]
    pub vulnerable_path: String,
    /// Indicators to check next.
    #[serde(default)]
    pub follow_up_checks: Vec<String>,
}

impl AlertRule {
    /// Creates a rule with empty descriptive text.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        condition: Condition,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            condition,
            escalation: None,
            description_template: String::new(),
            vulnerable_path: String::new(),
            follow_up_checks: Vec::new(),
        }
    }

    /// Adds a severity escalation.
    #[must_use]
    pub fn with_escalation(mut self, severity: Severity, condition: Condition) -> Self {
        self.escalation = Some(Escalation {
            severity,
            condition,
        });
        self
    }

    /// Sets the description template.
    #[must_use]
    pub fn with_description(mut self, template: impl Into<String>) -> Self {
        self.description_template = template.into();
        self
    }

    /// Sets the vulnerable path.
    #[must_use]
    pub fn with_vulnerable_path(mut self, path: impl Into<String>) -> Self {
        self.vulnerable_path = path.into();
        self
    }

    /// Sets the follow-up checks.
    #[must_use]
    pub fn with_follow_up_checks<S: Into<String>>(mut self, checks: impl IntoIterator<Item = S>) -> Self {
        self.follow_up_checks = checks.into_iter().map(Into::into).collect();
        self
    }

    /// Every signal the rule reads.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal> {
        let mut signals = self.condition.signals();
        if let Some(escalation) = &self.escalation {
            signals.extend(escalation.condition.signals());
            signals.sort();
            signals.dedup();
        }
        signals
    }

    /// Evaluates the rule against a snapshot.
    #[must_use]
    pub fn evaluate(&self, snapshot: &SignalSnapshot) -> RuleOutcome {
        match self.condition.evaluate(snapshot) {
            None => RuleOutcome::Skipped,
            Some(false) => RuleOutcome::Quiet,
            Some(true) => {
                let severity = match &self.escalation {
                    Some(escalation) if escalation.condition.evaluate(snapshot) == Some(true) => {
                        escalation.severity
                    }
                    _ => self.severity,
                };
                let observed: BTreeMap<Signal, f64> = self
                    .signals()
                    .into_iter()
                    .filter_map(|s| snapshot.get(s).map(|v| (s, v)))
                    .collect();
                RuleOutcome::Fired(Alert {
                    rule_id: self.id.clone(),
                    title: self.title.clone(),
                    severity,
                    description: render_template(&self.description_template, snapshot),
                    vulnerable_path: self.vulnerable_path.clone(),
                    follow_up_checks: self.follow_up_checks.clone(),
                    observed,
                    as_of: snapshot.as_of(),
                })
            }
        }
    }
}

impl Validate for AlertRule {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(ValidationError::new("id", "must not be empty"));
        }
        if self.title.trim().is_empty() {
            errors.push(ValidationError::new("title", "must not be empty"));
        }
        errors.extend(self.condition.validate().into_iter().map(|e| e.nested("condition")));
        if let Some(escalation) = &self.escalation {
            if escalation.severity <= self.severity {
                errors.push(ValidationError::with_rule(
                    "escalation.severity",
                    format!("{} does not exceed {}", escalation.severity, self.severity),
                    "escalates",
                ));
            }
            errors.extend(
                escalation
                    .condition
                    .validate()
                    .into_iter()
                    .map(|e| e.nested("escalation.condition")),
            );
        }
        errors
    }
}

/// Replaces `{signal_key}` placeholders with observed values (`n/a` if missing).
#[must_use]
pub fn render_template(template: &str, snapshot: &SignalSnapshot) -> String {
    Signal::ALL.iter().fold(template.to_string(), |text, signal| {
        let placeholder = format!("{{{}}}", signal.key());
        if !text.contains(&placeholder) {
            return text;
        }
        let value = snapshot
            .get(*signal)
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        text.replace(&placeholder, &value)
    })
}

/// The three canonical rules.
#[must_use]
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule::new(
            "belief_overheating",
            "Belief overheating",
            Severity::Watch,
            Condition::gap_above(Signal::ValuationZscoreChange, Signal::EarningsZscoreChange, 0.3),
        )
        .with_escalation(
            Severity::Action,
            Condition::gap_above(Signal::ValuationZscoreChange, Signal::EarningsZscoreChange, 0.6),
        )
        .with_description(
            "Valuation z-score moved {valuation_zscore_change} vs earnings {earnings_zscore_change} over one month",
        )
        .with_vulnerable_path("valuation expansion, then a sharp reversal on an earnings miss")
        .with_follow_up_checks(["Forward EPS revisions", "Analyst consensus changes"]),
        AlertRule::new(
            "collateral_stress",
            "Collateral stress",
            Severity::Action,
            Condition::all([
                Condition::above(Signal::VolatilityPercentile, 90.0),
                Condition::above(Signal::SpreadPercentile, 75.0),
                Condition::below(Signal::EquityReturn1mPct, -5.0),
            ]),
        )
        .with_description(
            "Volatility at {volatility_percentile} pctile, spreads at {spread_percentile} pctile, equities {equity_return_1m_pct}% over 1M",
        )
        .with_vulnerable_path("collateral value falls -> margin calls -> forced liquidation -> further declines")
        .with_follow_up_checks(["Leveraged ETF flows", "High-yield issuance pauses"]),
        AlertRule::new(
            "balance_sheet_contraction",
            "Balance sheet contraction",
            Severity::Action,
            Condition::all([
                Condition::below(Signal::CreditGrowthAnnualizedPct, 0.0),
                Condition::above(Signal::SpreadChange, 0.0),
            ]),
        )
        .with_description(
            "Bank credit {credit_growth_annualized_pct}% 3M annualized with spreads widening {spread_change}",
        )
        .with_vulnerable_path(
            "credit contraction -> falling asset prices -> collateral impairment -> further contraction",
        )
        .with_follow_up_checks(["M2 growth", "Fed balance sheet changes"]),
    ]
}
