//! Error types for the Reservoir library.
//!
//! Only caller contract violations are errors. Missing values, short
//! histories and absent inputs degrade to `None` or
//! [`Classified::InsufficientData`](crate::types::Classified) instead.

use chrono::NaiveDate;
use thiserror::Error;

/// A specialized Result type for Reservoir operations.
pub type ReservoirResult<T> = Result<T, ReservoirError>;

/// The main error type for Reservoir operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReservoirError {
    /// Timestamps are not strictly increasing.
    #[error("Unsorted timestamps in '{series}': {current} follows {previous} at index {index}")]
    UnsortedTimestamps {
        /// Name of the offending series.
        series: String,
        /// Index of the first out-of-order timestamp.
        index: usize,
        /// The timestamp preceding it.
        previous: NaiveDate,
        /// The out-of-order timestamp.
        current: NaiveDate,
    },

    /// The same timestamp appears more than once.
    #[error("Duplicate timestamp {date} in '{series}'")]
    DuplicateTimestamp {
        /// Name of the offending series.
        series: String,
        /// The repeated timestamp.
        date: NaiveDate,
    },

    /// Two collections that must have equal length do not.
    #[error("Length mismatch in '{series}': expected {expected}, got {actual}")]
    LengthMismatch {
        /// Name of the offending series.
        series: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Series that must share the same timestamps do not.
    #[error("Misaligned series '{left}' and '{right}': {reason}")]
    MisalignedSeries {
        /// First series name.
        left: String,
        /// Second series name.
        right: String,
        /// What differs.
        reason: String,
    },

    /// A window, period or threshold parameter is invalid.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },

    /// A normalized score lies outside [0, 100] or is not finite.
    #[error("Invalid score for '{name}': {value} is outside [0, 100]")]
    InvalidScore {
        /// Score name.
        name: String,
        /// The offending value.
        value: f64,
    },
}

impl ReservoirError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a misaligned series error.
    #[must_use]
    pub fn misaligned(
        left: impl Into<String>,
        right: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MisalignedSeries {
            left: left.into(),
            right: right.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid score error.
    #[must_use]
    pub fn invalid_score(name: impl Into<String>, value: f64) -> Self {
        Self::InvalidScore {
            name: name.into(),
            value,
        }
    }

    /// Checks that a period or window length is strictly positive.
    pub fn require_positive(name: &str, value: usize) -> ReservoirResult<usize> {
        if value == 0 {
            return Err(Self::invalid_parameter(name, "must be greater than zero"));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReservoirError::invalid_parameter("periods", "must be greater than zero");
        assert!(err.to_string().contains("periods"));

        let err = ReservoirError::DuplicateTimestamp {
            series: "vix".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert!(err.to_string().contains("2024-03-01"));
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(ReservoirError::require_positive("window", 3), Ok(3));
        assert!(ReservoirError::require_positive("window", 0).is_err());
    }
}
