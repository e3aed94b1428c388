//! Dated series of optional values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ReservoirError, ReservoirResult};

/// A single dated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation<T> {
    /// Observation date.
    pub date: NaiveDate,
    /// Observed value.
    pub value: T,
}

impl<T> Observation<T> {
    /// Creates a new observation.
    #[must_use]
    pub fn new(date: NaiveDate, value: T) -> Self {
        Self { date, value }
    }
}

#[derive(Serialize, Deserialize)]
struct SeriesRepr {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

/// An ordered, time-indexed sequence of optional values.
///
/// Invariants, checked at construction:
/// - timestamps are strictly increasing (sorted, no duplicates)
/// - one value per timestamp
/// - missing values are `None`; non-finite inputs are normalized to `None`
///
/// A series is immutable once built. Transforms return new series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRepr", into = "SeriesRepr")]
pub struct DatedSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl TryFrom<SeriesRepr> for DatedSeries {
    type Error = ReservoirError;

    fn try_from(repr: SeriesRepr) -> Result<Self, Self::Error> {
        Self::new(repr.name, repr.dates, repr.values)
    }
}

impl From<DatedSeries> for SeriesRepr {
    fn from(series: DatedSeries) -> Self {
        Self {
            name: series.name,
            dates: series.dates,
            values: series.values,
        }
    }
}

fn normalize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl DatedSeries {
    /// Creates a series from parallel date and value vectors.
    ///
    /// Fails if the lengths differ or the dates are not strictly increasing.
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<Option<f64>>,
    ) -> ReservoirResult<Self> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(ReservoirError::LengthMismatch {
                series: name,
                expected: dates.len(),
                actual: values.len(),
            });
        }

        for (index, pair) in dates.windows(2).enumerate() {
            let (previous, current) = (pair[0], pair[1]);
            if current == previous {
                return Err(ReservoirError::DuplicateTimestamp {
                    series: name,
                    date: current,
                });
            }
            if current < previous {
                return Err(ReservoirError::UnsortedTimestamps {
                    series: name,
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }

        let values = values.into_iter().map(normalize).collect();
        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Creates a series from `(date, value)` pairs with optional values.
    pub fn from_observations(
        name: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> ReservoirResult<Self> {
        let (dates, values) = observations.into_iter().unzip();
        Self::new(name, dates, values)
    }

    /// Creates a series from fully-populated `(date, value)` pairs.
    pub fn from_values(
        name: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> ReservoirResult<Self> {
        Self::from_observations(
            name,
            observations.into_iter().map(|(date, value)| (date, Some(value))),
        )
    }

    /// Creates an empty series.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a new series on this series' timestamps with replacement values.
    ///
    /// Used by transforms: the dates are already validated, only the length is checked.
    pub fn derive(
        &self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> ReservoirResult<Self> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(ReservoirError::LengthMismatch {
                series: name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            name,
            dates: self.dates.clone(),
            values: values.into_iter().map(normalize).collect(),
        })
    }

    /// Series name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of the series under a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Number of timestamps (including missing values).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the series has no timestamps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of non-missing values.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Timestamps in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Values aligned with [`dates`](Self::dates).
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at a positional index.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Observation at a positional index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Observation<Option<f64>>> {
        let date = *self.dates.get(index)?;
        Some(Observation::new(date, self.values[index]))
    }

    /// Iterates over observations in date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Observation<Option<f64>>> + '_ {
        self.dates
            .iter()
            .zip(self.values.iter())
            .map(|(date, value)| Observation::new(*date, *value))
    }

    /// Last observation, missing or not.
    #[must_use]
    pub fn latest(&self) -> Option<Observation<Option<f64>>> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Last non-missing observation.
    #[must_use]
    pub fn latest_valid(&self) -> Option<Observation<f64>> {
        self.iter()
            .rev()
            .find_map(|obs| obs.value.map(|v| Observation::new(obs.date, v)))
    }

    /// Value recorded at exactly `date`.
    #[must_use]
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .and_then(|i| self.values[i])
    }

    /// Returns the prefix of the series dated on or before `as_of`.
    #[must_use]
    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        let end = self.dates.partition_point(|d| *d <= as_of);
        Self {
            name: self.name.clone(),
            dates: self.dates[..end].to_vec(),
            values: self.values[..end].to_vec(),
        }
    }

    /// Applies `f` to every present value; missing values stay missing.
    #[must_use]
    pub fn map_values<F>(&self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> Option<f64>,
    {
        Self {
            name: name.into(),
            dates: self.dates.clone(),
            values: self
                .values
                .iter()
                .map(|v| normalize(v.and_then(&f)))
                .collect(),
        }
    }

    /// Fails unless `other` has exactly the same timestamps.
    pub fn ensure_aligned(&self, other: &DatedSeries) -> ReservoirResult<()> {
        if self.dates.len() != other.dates.len() {
            return Err(ReservoirError::misaligned(
                &self.name,
                &other.name,
                format!("{} vs {} timestamps", self.len(), other.len()),
            ));
        }
        if let Some(i) = (0..self.dates.len()).find(|&i| self.dates[i] != other.dates[i]) {
            return Err(ReservoirError::misaligned(
                &self.name,
                &other.name,
                format!(
                    "timestamp {} differs from {} at index {}",
                    self.dates[i], other.dates[i], i
                ),
            ));
        }
        Ok(())
    }

    /// Combines two aligned series pointwise; missing on either side stays missing.
    pub fn zip_with<F>(
        &self,
        other: &DatedSeries,
        name: impl Into<String>,
        f: F,
    ) -> ReservoirResult<Self>
    where
        F: Fn(f64, f64) -> Option<f64>,
    {
        self.ensure_aligned(other)?;
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => normalize(f(*a, *b)),
                _ => None,
            })
            .collect();
        Ok(Self {
            name: name.into(),
            dates: self.dates.clone(),
            values,
        })
    }

    /// Restricts every series to the timestamps common to all of them.
    ///
    /// Components reported on different calendars (daily RRP, weekly H.4.1
    /// items) become comparable after alignment.
    #[must_use]
    pub fn align(series: &[&DatedSeries]) -> Vec<DatedSeries> {
        let Some((first, rest)) = series.split_first() else {
            return Vec::new();
        };

        let mut common: BTreeSet<NaiveDate> = first.dates.iter().copied().collect();
        for s in rest {
            let dates: BTreeSet<NaiveDate> = s.dates.iter().copied().collect();
            common = common.intersection(&dates).copied().collect();
        }

        log::debug!(
            "aligning {} series on {} common timestamps",
            series.len(),
            common.len()
        );

        series
            .iter()
            .map(|s| {
                let (dates, values) = s
                    .iter()
                    .filter(|obs| common.contains(&obs.date))
                    .map(|obs| (obs.date, obs.value))
                    .unzip();
                DatedSeries {
                    name: s.name.clone(),
                    dates,
                    values,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_new_validates_order() {
        let err = DatedSeries::new("x", vec![d(2), d(1)], vec![Some(1.0), Some(2.0)]).unwrap_err();
        assert!(matches!(err, ReservoirError::UnsortedTimestamps { index: 1, .. }));

        let err = DatedSeries::new("x", vec![d(1), d(1)], vec![Some(1.0), Some(2.0)]).unwrap_err();
        assert!(matches!(err, ReservoirError::DuplicateTimestamp { .. }));

        let err = DatedSeries::new("x", vec![d(1)], vec![]).unwrap_err();
        assert!(matches!(err, ReservoirError::LengthMismatch { .. }));
    }

    #[test]
    fn test_non_finite_is_missing() {
        let s = DatedSeries::new(
            "x",
            vec![d(1), d(2), d(3)],
            vec![Some(f64::NAN), Some(f64::INFINITY), Some(1.0)],
        )
        .unwrap();
        assert_eq!(s.values(), &[None, None, Some(1.0)]);
        assert_eq!(s.valid_count(), 1);
    }

    #[test]
    fn test_latest_and_lookup() {
        let s = DatedSeries::new("x", vec![d(1), d(2), d(3)], vec![Some(1.0), Some(2.0), None])
            .unwrap();
        assert_eq!(s.latest().unwrap().value, None);
        assert_eq!(s.latest_valid().unwrap(), Observation::new(d(2), 2.0));
        assert_eq!(s.value_at(d(1)), Some(1.0));
        assert_eq!(s.value_at(d(9)), None);
        assert_eq!(s.truncate_to(d(2)).len(), 2);
    }

    #[test]
    fn test_latest_valid_skips_trailing_gaps() {
        let s = DatedSeries::new(
            "x",
            vec![d(1), d(2), d(3), d(4)],
            vec![Some(1.0), Some(5.0), None, None],
        )
        .unwrap();
        assert_eq!(s.latest_valid(), Some(Observation::new(d(2), 5.0)));
        let reversed: Vec<_> = s.iter().rev().map(|obs| obs.date).collect();
        assert_eq!(reversed, vec![d(4), d(3), d(2), d(1)]);

        let empty = DatedSeries::new("x", vec![d(1)], vec![None]).unwrap();
        assert_eq!(empty.latest_valid(), None);
    }

    #[test]
    fn test_zip_requires_alignment() {
        let a = DatedSeries::from_values("a", [(d(1), 1.0), (d(2), 2.0)]).unwrap();
        let b = DatedSeries::from_values("b", [(d(1), 3.0), (d(3), 4.0)]).unwrap();
        assert!(a.zip_with(&b, "sum", |x, y| Some(x + y)).is_err());

        let c = DatedSeries::from_observations("c", [(d(1), Some(3.0)), (d(2), None)]).unwrap();
        let sum = a.zip_with(&c, "sum", |x, y| Some(x + y)).unwrap();
        assert_eq!(sum.values(), &[Some(4.0), None]);
    }

    #[test]
    fn test_align_inner_join() {
        let a = DatedSeries::from_values("a", [(d(1), 1.0), (d(2), 2.0), (d(3), 3.0)]).unwrap();
        let b = DatedSeries::from_values("b", [(d(2), 20.0), (d(3), 30.0), (d(4), 40.0)]).unwrap();
        let aligned = DatedSeries::align(&[&a, &b]);
        assert_eq!(aligned[0].dates(), &[d(2), d(3)]);
        assert_eq!(aligned[1].values(), &[Some(20.0), Some(30.0)]);
        assert!(aligned[0].ensure_aligned(&aligned[1]).is_ok());
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"name":"x","dates":["2024-01-02","2024-01-01"],"values":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<DatedSeries>(json).is_err());

        let json = r#"{"name":"x","dates":["2024-01-01","2024-01-02"],"values":[1.0,null]}"#;
        let s: DatedSeries = serde_json::from_str(json).unwrap();
        assert_eq!(s.values(), &[Some(1.0), None]);
    }
}
