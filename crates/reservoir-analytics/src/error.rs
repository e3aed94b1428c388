//! Error types for analytics operations.

use std::fmt;
use thiserror::Error;

use reservoir_core::ReservoirError;

/// A specialized Result type for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised by metrics, the regime classifier and the alert engine.
///
/// Data insufficiency is never an error here; it surfaces as
/// [`Classified::InsufficientData`](reservoir_core::Classified) or a rule that
/// does not fire.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A contract violation in the underlying series or transforms.
    #[error(transparent)]
    Core(#[from] ReservoirError),

    /// A configuration value is invalid.
    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfig {
        /// Path of the offending field.
        field: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Several configuration values are invalid.
    #[error("Invalid configuration: {}", join_errors(.0))]
    InvalidConfigs(Vec<ValidationError>),

    /// Two alert rules share an id.
    #[error("Duplicate alert rule id '{id}'")]
    DuplicateRule {
        /// The repeated id.
        id: String,
    },

    /// An alert rule is malformed.
    #[error("Invalid alert rule '{id}': {reason}")]
    InvalidRule {
        /// Rule id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AnalyticsError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid rule error.
    #[must_use]
    pub fn invalid_rule(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
    /// Validation rule that was violated.
    pub rule: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Creates a validation error with a rule name.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }

    /// Returns the error with its field nested under `prefix`.
    #[must_use]
    pub fn nested(self, prefix: &str) -> Self {
        Self {
            field: format!("{}.{}", prefix, self.field),
            ..self
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref rule) = self.rule {
            write!(f, "{}: {} (rule: {})", self.field, self.message, rule)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Trait for validatable configurations.
pub trait Validate {
    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or an empty vector if valid.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates and returns an error if invalid.
    fn validate_or_error(&self) -> AnalyticsResult<()> {
        let mut errors = self.validate();
        match errors.len() {
            0 => Ok(()),
            1 => {
                let err = errors.remove(0);
                Err(AnalyticsError::InvalidConfig {
                    field: err.field,
                    reason: err.message,
                })
            }
            _ => Err(AnalyticsError::InvalidConfigs(errors)),
        }
    }
}

/// Pushes an error unless `value` is a finite number.
pub(crate) fn check_finite(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() {
        errors.push(ValidationError::with_rule(
            field,
            format!("{value} is not a finite number"),
            "finite",
        ));
    }
}

/// Pushes an error unless `lower < upper` (both finite).
pub(crate) fn check_ascending(
    errors: &mut Vec<ValidationError>,
    lower_field: &str,
    lower: f64,
    upper_field: &str,
    upper: f64,
) {
    check_finite(errors, lower_field, lower);
    check_finite(errors, upper_field, upper);
    if lower.is_finite() && upper.is_finite() && lower >= upper {
        errors.push(ValidationError::with_rule(
            lower_field,
            format!("{lower} must be below {upper_field} ({upper})"),
            "ascending_thresholds",
        ));
    }
}

/// Pushes an error unless `value` lies in `[lo, hi]`.
pub(crate) fn check_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: f64,
    lo: f64,
    hi: f64,
) {
    if !(lo..=hi).contains(&value) {
        errors.push(ValidationError::with_rule(
            field,
            format!("{value} must lie in [{lo}, {hi}]"),
            "range",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thresholds(f64, f64);

    impl Validate for Thresholds {
        fn validate(&self) -> Vec<ValidationError> {
            let mut errors = Vec::new();
            check_ascending(&mut errors, "low", self.0, "high", self.1);
            errors
        }
    }

    #[test]
    fn test_validate_or_error() {
        assert!(Thresholds(1.0, 2.0).validate_or_error().is_ok());

        let err = Thresholds(2.0, 1.0).validate_or_error().unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfig { ref field, .. } if field == "low"));

        let err = Thresholds(f64::NAN, f64::INFINITY).validate_or_error().unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfigs(ref e) if e.len() == 2));
    }

    #[test]
    fn test_nested_field() {
        let err = ValidationError::new("weight", "negative").nested("regime");
        assert_eq!(err.to_string(), "regime.weight: negative");
    }

    #[test]
    fn test_core_error_converts() {
        let err: AnalyticsError = ReservoirError::invalid_parameter("periods", "zero").into();
        assert!(err.to_string().contains("periods"));
    }
}
