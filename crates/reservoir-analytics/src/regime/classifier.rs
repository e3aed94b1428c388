//! Composite scoring, banding and explanation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use reservoir_core::{Classified, ReservoirError};
use reservoir_math::statistics::population_std;

use super::{Factor, MacroRegime, RegimeConfig};
use crate::error::{AnalyticsResult, Validate};

/// One factor score with the date it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Risk-oriented score, 0-100.
    pub score: f64,
    /// Observation date, when known.
    pub as_of: Option<NaiveDate>,
}

/// Factor scores for one classification. Absent factors are missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    scores: BTreeMap<Factor, FactorObservation>,
}

impl FactorScores {
    /// Creates an empty set of scores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an undated score.
    #[must_use]
    pub fn with(mut self, factor: Factor, score: f64) -> Self {
        self.insert(factor, FactorObservation { score, as_of: None });
        self
    }

    /// Adds a dated score.
    #[must_use]
    pub fn with_observation(mut self, factor: Factor, score: f64, as_of: NaiveDate) -> Self {
        self.insert(
            factor,
            FactorObservation {
                score,
                as_of: Some(as_of),
            },
        );
        self
    }

    /// Inserts or replaces a score.
    pub fn insert(&mut self, factor: Factor, observation: FactorObservation) {
        self.scores.insert(factor, observation);
    }

    /// Score of one factor.
    #[must_use]
    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.scores.get(&factor).map(|o| o.score)
    }

    /// Full observation of one factor.
    #[must_use]
    pub fn observation(&self, factor: Factor) -> Option<&FactorObservation> {
        self.scores.get(&factor)
    }

    /// Number of present factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if no factor is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterates over present factors in factor order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, &FactorObservation)> {
        self.scores.iter().map(|(f, o)| (*f, o))
    }
}

/// A factor's share of the composite's distance from neutral (50).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    /// The factor.
    pub factor: Factor,
    /// Its score.
    pub score: f64,
    /// Weight after renormalizing over present factors.
    pub weight: f64,
    /// `weight × (score - 50)`.
    pub contribution: f64,
}

/// Result of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassification {
    /// Primary regime, or insufficient data.
    pub primary: Classified<MacroRegime>,
    /// Weighted composite score, 0-100.
    pub composite: Option<f64>,
    /// Input scores.
    pub scores: FactorScores,
    /// Contributions, largest absolute contribution first.
    pub contributions: Vec<FactorContribution>,
    /// Agreement among factors: 1 when all agree, near 0 when split.
    pub confidence: Option<f64>,
    /// True if confidence is below the caution threshold.
    pub low_confidence: bool,
    /// True if the volatility veto forced Stress.
    pub volatility_veto: bool,
    /// Explanation lines, most influential factor first.
    pub explanation: Vec<String>,
    /// Missing or stale factors.
    pub data_quality_warning: Option<String>,
}

/// Stateless regime classifier over validated settings.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
}

impl RegimeClassifier {
    /// Creates a classifier, rejecting invalid settings.
    pub fn new(config: RegimeConfig) -> AnalyticsResult<Self> {
        config.validate_or_error()?;
        Ok(Self { config })
    }

    /// The classifier settings.
    #[must_use]
    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// Classifies one snapshot of factor scores.
    ///
    /// Missing factors are dropped and the remaining weights renormalized.
    /// A score outside [0, 100] is an error.
    pub fn classify(&self, scores: &FactorScores) -> AnalyticsResult<RegimeClassification> {
        for (factor, observation) in scores.iter() {
            if !(0.0..=100.0).contains(&observation.score) {
                return Err(ReservoirError::invalid_score(factor.key(), observation.score).into());
            }
        }

        let config = &self.config;
        let warning = self.data_quality_warning(scores);
        let present: Vec<(Factor, f64)> = Factor::ALL
            .iter()
            .filter_map(|f| scores.get(*f).map(|s| (*f, s)))
            .collect();
        let total_weight: f64 = present.iter().map(|(f, _)| config.weights.get(*f)).sum();

        if present.len() < config.min_factors || total_weight <= 0.0 {
            log::debug!(
                "regime: {} of {} factors present, need {}",
                present.len(),
                Factor::ALL.len(),
                config.min_factors
            );
            return Ok(RegimeClassification {
                primary: Classified::InsufficientData,
                composite: None,
                scores: scores.clone(),
                contributions: Vec::new(),
                confidence: None,
                low_confidence: false,
                volatility_veto: false,
                explanation: vec![format!(
                    "Insufficient data: {} of {} factors present, {} required",
                    present.len(),
                    Factor::ALL.len(),
                    config.min_factors
                )],
                data_quality_warning: warning,
            });
        }

        let mut contributions: Vec<FactorContribution> = present
            .iter()
            .map(|(factor, score)| {
                let weight = config.weights.get(*factor) / total_weight;
                FactorContribution {
                    factor: *factor,
                    score: *score,
                    weight,
                    contribution: weight * (score - 50.0),
                }
            })
            .collect();
        let composite: f64 = contributions.iter().map(|c| c.weight * c.score).sum();
        contributions.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));

        let veto = scores
            .get(Factor::Volatility)
            .is_some_and(|v| v >= config.volatility_veto);
        let regime = if veto {
            MacroRegime::Stress
        } else {
            config.band(composite)
        };

        let values: Vec<f64> = present.iter().map(|(_, s)| *s).collect();
        let dispersion = population_std(&values).unwrap_or(0.0);
        let confidence = (1.0 - dispersion / 50.0).clamp(0.0, 1.0);

        let mut explanation: Vec<String> = contributions.iter().map(explain).collect();
        if veto {
            explanation.push(format!(
                "Volatility veto: volatility score {:.0} >= {:.0} forces Stress",
                scores.get(Factor::Volatility).unwrap_or_default(),
                config.volatility_veto
            ));
        }
        explanation.push(format!("Vulnerable path: {}", regime.vulnerable_path()));

        Ok(RegimeClassification {
            primary: Classified::Level(regime),
            composite: Some(composite),
            scores: scores.clone(),
            contributions,
            confidence: Some(confidence),
            low_confidence: confidence < config.low_confidence_threshold,
            volatility_veto: veto,
            explanation,
            data_quality_warning: warning,
        })
    }

    fn data_quality_warning(&self, scores: &FactorScores) -> Option<String> {
        let mut warnings = Vec::new();

        let missing: Vec<&str> = Factor::ALL
            .iter()
            .filter(|f| scores.get(**f).is_none())
            .map(|f| f.key())
            .collect();
        if !missing.is_empty() {
            warnings.push(format!("missing factors: {}", missing.join(", ")));
        }

        let newest = scores.iter().filter_map(|(_, o)| o.as_of).max();
        if let Some(newest) = newest {
            for (factor, observation) in scores.iter() {
                let Some(as_of) = observation.as_of else {
                    continue;
                };
                let lag = (newest - as_of).num_days();
                if lag > self.config.max_staleness_days {
                    warnings.push(format!(
                        "{} is {} days older than the newest factor",
                        factor.key(),
                        lag
                    ));
                }
            }
        }

        (!warnings.is_empty()).then(|| warnings.join("; "))
    }
}

fn explain(c: &FactorContribution) -> String {
    let direction = if c.contribution > 0.0 {
        "toward stress"
    } else if c.contribution < 0.0 {
        "toward expansion"
    } else {
        "neutral"
    };
    format!(
        "{}: score {:.0} x weight {:.2} = {:+.1} ({})",
        c.factor, c.score, c.weight, c.contribution, direction
    )
}
