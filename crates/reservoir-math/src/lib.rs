//! # Reservoir Math
//!
//! Pure transforms over [`DatedSeries`](reservoir_core::DatedSeries).
//!
//! This crate provides:
//!
//! - **Transforms**: YoY, annualized short-term change, period change,
//!   differences, acceleration, rolling z-score and percentile rank
//! - **Rolling statistics**: mean, std, min, max, median, skew, kurtosis
//! - **Inflection detection**: local peaks and troughs
//! - **Resampling**: weekly and month-end frequency standardization
//! - **Snapshots**: latest values with their standard transforms
//!
//! ## Missing data
//!
//! Every transform returns a new series on the input's timestamps. A missing
//! value anywhere in the lookback a calculation needs yields a missing output
//! at that timestamp. Only malformed parameters are errors.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use reservoir_core::DatedSeries;
//! use reservoir_math::transforms::year_over_year;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//! let series = DatedSeries::from_values(
//!     "m2",
//!     (0..13).map(|i| (start + chrono::Months::new(i), 100.0 + f64::from(i))),
//! )
//! .unwrap();
//!
//! let yoy = year_over_year(&series, 12).unwrap();
//! assert!((yoy.value(12).unwrap() - 0.12).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::uninlined_format_args)]

pub mod inflection;
pub mod resample;
pub mod rolling;
pub mod snapshot;
pub mod statistics;
pub mod transforms;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::inflection::{detect_inflection, Inflection};
    pub use crate::resample::{standardize_frequency, Aggregation};
    pub use crate::rolling::{rolling_stats, RollingStats};
    pub use crate::snapshot::{latest_snapshot, LatestValues};
    pub use crate::transforms::{
        acceleration, annualized_short_term_change, difference, percentile_rank,
        percentile_rank_with, period_change, rolling_zscore, rolling_zscore_with,
        second_difference, year_over_year, zscore_change, RollingWindow,
    };
}

pub use transforms::RollingWindow;
