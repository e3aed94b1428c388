//! Categorical outcome with an explicit insufficient-data marker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A classification that either produced a level or lacked the data to do so.
///
/// Metrics and the regime classifier never substitute a numeric default for
/// missing inputs; they return [`Classified::InsufficientData`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classified<T> {
    /// A level was assigned.
    Level(T),
    /// Required inputs were missing or the history was too short.
    InsufficientData,
}

impl<T> Classified<T> {
    /// Returns the level if one was assigned.
    #[must_use]
    pub fn level(&self) -> Option<&T> {
        match self {
            Classified::Level(level) => Some(level),
            Classified::InsufficientData => None,
        }
    }

    /// Consumes the classification, returning the level if any.
    #[must_use]
    pub fn into_level(self) -> Option<T> {
        match self {
            Classified::Level(level) => Some(level),
            Classified::InsufficientData => None,
        }
    }

    /// Returns true if no level could be assigned.
    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Classified::InsufficientData)
    }

    /// Maps the level, keeping the insufficient-data marker.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Classified<U> {
        match self {
            Classified::Level(level) => Classified::Level(f(level)),
            Classified::InsufficientData => Classified::InsufficientData,
        }
    }
}

impl<T> From<Option<T>> for Classified<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Classified::InsufficientData, Classified::Level)
    }
}

impl<T: fmt::Display> fmt::Display for Classified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classified::Level(level) => write!(f, "{level}"),
            Classified::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert_eq!(Classified::from(Some(3)), Classified::Level(3));
        assert!(Classified::<i32>::from(None).is_insufficient());
    }

    #[test]
    fn test_display() {
        assert_eq!(Classified::Level("Ample").to_string(), "Ample");
        assert_eq!(
            Classified::<&str>::InsufficientData.to_string(),
            "Insufficient data"
        );
    }

    #[test]
    fn test_map() {
        assert_eq!(Classified::Level(2).map(|x| x * 10).level(), Some(&20));
    }
}
