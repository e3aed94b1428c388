//! Property-based tests for the transform library.
//!
//! - YoY equals the lagged ratio exactly, and is missing when either side is
//! - Rolling z-scores stay missing until a full window of present values
//! - Percentile ranks stay within [0, 100]

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use reservoir_core::DatedSeries;
use reservoir_math::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn build(values: &[Option<f64>]) -> DatedSeries {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    DatedSeries::from_observations(
        "prop",
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v)),
    )
    .unwrap()
}

fn values_strategy(max_len: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(
        prop_oneof![
            5 => (1.0..1000.0f64).prop_map(Some),
            1 => Just(None),
        ],
        0..max_len,
    )
}

// =============================================================================
// PROPERTY: YEAR OVER YEAR
// =============================================================================

proptest! {
    #[test]
    fn property_yoy_matches_lagged_ratio(values in values_strategy(80), periods in 1usize..15) {
        let series = build(&values);
        let yoy = year_over_year(&series, periods).unwrap();

        prop_assert_eq!(yoy.len(), series.len());
        for t in 0..series.len() {
            let expected = t
                .checked_sub(periods)
                .and_then(|lag| Some(values[t]? / values[lag]? - 1.0));
            prop_assert_eq!(yoy.value(t), expected);
        }
    }
}

// =============================================================================
// PROPERTY: ROLLING WINDOWS
// =============================================================================

proptest! {
    #[test]
    fn property_zscore_needs_full_window(values in values_strategy(60), size in 2usize..12) {
        let series = build(&values);
        let z = rolling_zscore_with(&series, RollingWindow::new(size).unwrap()).unwrap();

        for t in 0..series.len() {
            let start = (t + 1).saturating_sub(size);
            let present = values[start..=t].iter().filter(|v| v.is_some()).count();
            if present < size {
                prop_assert_eq!(z.value(t), None);
            }
            if let Some(score) = z.value(t) {
                prop_assert!(score.is_finite());
            }
        }
    }

    #[test]
    fn property_percentile_in_range(values in values_strategy(60), size in 1usize..12) {
        let series = build(&values);
        let window = RollingWindow::new(size).unwrap().half_filled();
        let pct = percentile_rank_with(&series, window).unwrap();

        for p in pct.values().iter().flatten() {
            prop_assert!(*p > 0.0 && *p <= 100.0);
        }
    }

    #[test]
    fn property_constant_series_has_no_zscore(level in 0.001..1e6f64, len in 3usize..40) {
        let series = build(&vec![Some(level); len]);
        let z = rolling_zscore_with(&series, RollingWindow::new(3).unwrap()).unwrap();
        prop_assert!(z.values().iter().all(Option::is_none));
    }
}
