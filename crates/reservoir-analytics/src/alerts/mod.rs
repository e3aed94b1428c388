//! Rule-based alerting over derived signals.
//!
//! A [`SignalBuilder`] reduces raw series to a [`SignalSnapshot`]; an
//! [`AlertEngine`] evaluates [`AlertRule`]s against it. Rules whose inputs are
//! missing never fire.

mod engine;
mod rules;
mod signals;

pub use engine::AlertEngine;
pub use rules::{default_rules, render_template, AlertRule, Condition, Escalation, RuleOutcome};
pub use signals::{Signal, SignalBuilder, SignalConfig, SignalInputs, SignalSnapshot};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth noting
    Informational,
    /// Monitor closely
    Watch,
    /// Act on it
    Action,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Informational => "INFO",
            Severity::Watch => "WATCH",
            Severity::Action => "ACTION",
        };
        write!(f, "{name}")
    }
}

/// A fired alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Id of the rule that fired.
    pub rule_id: String,
    /// Rule title.
    pub title: String,
    /// Effective severity, after escalation.
    pub severity: Severity,
    /// Rendered description.
    pub description: String,
    /// How the vulnerability would propagate.
    pub vulnerable_path: String,
    /// Indicators to check next.
    pub follow_up_checks: Vec<String>,
    /// Signal values the rule read.
    pub observed: BTreeMap<Signal, f64>,
    /// Date of the snapshot.
    pub as_of: Option<NaiveDate>,
}

impl Alert {
    /// One-line human-readable message.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = format!("[{}] {}", self.severity, self.title);
        if !self.description.is_empty() {
            message.push_str(": ");
            message.push_str(&self.description);
        }
        if !self.vulnerable_path.is_empty() {
            message.push_str(&format!(". Vulnerable path: {}", self.vulnerable_path));
        }
        if !self.follow_up_checks.is_empty() {
            message.push_str(&format!(". Check: {}", self.follow_up_checks.join(", ")));
        }
        message
    }
}

/// Alert counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    /// Informational alerts.
    pub informational: usize,
    /// Watch alerts.
    pub watch: usize,
    /// Action alerts.
    pub action: usize,
}

impl AlertSummary {
    /// Counts alerts by severity.
    #[must_use]
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut summary, alert| {
            match alert.severity {
                Severity::Informational => summary.informational += 1,
                Severity::Watch => summary.watch += 1,
                Severity::Action => summary.action += 1,
            }
            summary
        })
    }

    /// Total alert count.
    #[must_use]
    pub fn total(&self) -> usize {
        self.informational + self.watch + self.action
    }

    /// Most urgent severity present.
    #[must_use]
    pub fn highest(&self) -> Option<Severity> {
        if self.action > 0 {
            Some(Severity::Action)
        } else if self.watch > 0 {
            Some(Severity::Watch)
        } else if self.informational > 0 {
            Some(Severity::Informational)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let snapshot = SignalSnapshot::new()
            .with(Signal::VolatilityPercentile, 95.0)
            .with(Signal::SpreadPercentile, 80.0)
            .with(Signal::EquityReturn1mPct, -7.0);
        let alerts = AlertEngine::with_default_rules().evaluate(&snapshot);
        let message = alerts[0].format_message();
        assert!(message.starts_with("[ACTION] Collateral stress: Volatility at 95.00 pctile"));
        assert!(message.contains("equities -7.00% over 1M"));
        assert!(message.ends_with("Check: Leveraged ETF flows, High-yield issuance pauses"));
        assert_eq!(alerts[0].observed.len(), 3);
    }

    #[test]
    fn test_summary() {
        let alert = |severity| Alert {
            rule_id: "r".into(),
            title: "R".into(),
            severity,
            description: String::new(),
            vulnerable_path: String::new(),
            follow_up_checks: Vec::new(),
            observed: BTreeMap::new(),
            as_of: None,
        };
        let summary = AlertSummary::from_alerts(&[alert(Severity::Watch), alert(Severity::Watch)]);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.highest(), Some(Severity::Watch));
        assert_eq!(AlertSummary::default().highest(), None);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Action > Severity::Watch);
        assert!(Severity::Watch > Severity::Informational);
        assert_eq!(serde_json::to_string(&Severity::Action).unwrap(), "\"action\"");
    }
}
