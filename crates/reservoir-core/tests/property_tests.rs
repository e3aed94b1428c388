//! Property-based tests for dated series invariants.
//!
//! - Construction accepts exactly the strictly increasing timestamp sequences
//! - Non-finite inputs never survive as values
//! - Alignment yields series sharing identical timestamps

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use reservoir_core::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Strictly increasing dates built from positive day gaps.
fn dates_from_gaps(gaps: &[u8]) -> Vec<NaiveDate> {
    let mut date = base_date();
    gaps.iter()
        .map(|gap| {
            date += Duration::days(i64::from(*gap) + 1);
            date
        })
        .collect()
}

fn value_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        4 => (-1.0e6..1.0e6f64).prop_map(Some),
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
        1 => Just(Some(f64::INFINITY)),
    ]
}

// =============================================================================
// PROPERTY: CONSTRUCTION
// =============================================================================

proptest! {
    #[test]
    fn property_increasing_dates_accepted(
        gaps in prop::collection::vec(0u8..10, 0..60),
        seed in prop::collection::vec(value_strategy(), 60),
    ) {
        let dates = dates_from_gaps(&gaps);
        let values = seed[..dates.len()].to_vec();
        let series = DatedSeries::new("s", dates.clone(), values).unwrap();

        prop_assert_eq!(series.len(), dates.len());
        prop_assert!(series.values().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn property_reversed_dates_rejected(gaps in prop::collection::vec(0u8..10, 2..40)) {
        let mut dates = dates_from_gaps(&gaps);
        dates.reverse();
        let values = vec![Some(1.0); dates.len()];

        let err = DatedSeries::new("s", dates, values).unwrap_err();
        let is_unsorted = matches!(err, ReservoirError::UnsortedTimestamps { .. });
        prop_assert!(is_unsorted);
    }
}

// =============================================================================
// PROPERTY: ALIGNMENT
// =============================================================================

proptest! {
    #[test]
    fn property_align_shares_timestamps(
        a_gaps in prop::collection::vec(0u8..3, 1..50),
        b_gaps in prop::collection::vec(0u8..3, 1..50),
    ) {
        let a_dates = dates_from_gaps(&a_gaps);
        let b_dates = dates_from_gaps(&b_gaps);
        let a = DatedSeries::new("a", a_dates.clone(), vec![Some(1.0); a_dates.len()]).unwrap();
        let b = DatedSeries::new("b", b_dates.clone(), vec![Some(2.0); b_dates.len()]).unwrap();

        let aligned = DatedSeries::align(&[&a, &b]);
        prop_assert_eq!(aligned.len(), 2);
        prop_assert!(aligned[0].ensure_aligned(&aligned[1]).is_ok());
        prop_assert!(aligned[0].dates().iter().all(|d| b_dates.contains(d)));
        prop_assert!(aligned[0].len() <= a.len().min(b.len()));
    }

    #[test]
    fn property_truncate_is_prefix(
        gaps in prop::collection::vec(0u8..5, 1..50),
        offset in 0i64..400,
    ) {
        let dates = dates_from_gaps(&gaps);
        let series = DatedSeries::new("s", dates.clone(), vec![Some(1.0); dates.len()]).unwrap();
        let as_of = base_date() + Duration::days(offset);

        let truncated = series.truncate_to(as_of);
        prop_assert!(truncated.dates().iter().all(|d| *d <= as_of));
        prop_assert_eq!(truncated.dates(), &dates[..truncated.len()]);
    }
}
