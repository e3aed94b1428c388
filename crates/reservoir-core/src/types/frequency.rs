//! Sampling frequency of a dated series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReservoirError;

/// Sampling frequency of a series.
///
/// The engine never infers frequency from timestamp spacing. Callers pick the
/// frequency that matches their data and pass its constants to the transforms;
/// a mismatch silently produces wrong statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Business-daily observations (252 per year)
    #[default]
    Daily,
    /// Weekly observations (52 per year)
    Weekly,
    /// Monthly observations (12 per year)
    Monthly,
}

impl Frequency {
    /// Returns the number of observations per year.
    #[must_use]
    pub fn periods_per_year(&self) -> usize {
        match self {
            Frequency::Daily => 252,
            Frequency::Weekly => 52,
            Frequency::Monthly => 12,
        }
    }

    /// Returns the number of observations in one month.
    #[must_use]
    pub fn periods_per_month(&self) -> usize {
        match self {
            Frequency::Daily => 21,
            Frequency::Weekly => 4,
            Frequency::Monthly => 1,
        }
    }

    /// Returns the number of observations in one quarter.
    #[must_use]
    pub fn periods_per_quarter(&self) -> usize {
        match self {
            Frequency::Daily => 63,
            Frequency::Weekly => 13,
            Frequency::Monthly => 3,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Frequency {
    type Err = ReservoirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "daily" => Ok(Frequency::Daily),
            "w" | "weekly" => Ok(Frequency::Weekly),
            "m" | "monthly" => Ok(Frequency::Monthly),
            other => Err(ReservoirError::invalid_parameter(
                "frequency",
                format!("unknown frequency '{other}', use daily, weekly or monthly"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_periods() {
        assert_eq!(Frequency::Daily.periods_per_year(), 252);
        assert_eq!(Frequency::Weekly.periods_per_year(), 52);
        assert_eq!(Frequency::Monthly.periods_per_year(), 12);
        assert_eq!(Frequency::Weekly.periods_per_quarter(), 13);
        assert_eq!(Frequency::Daily.periods_per_month(), 21);
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("m".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_frequency_serde() {
        let json = serde_json::to_string(&Frequency::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
    }
}
