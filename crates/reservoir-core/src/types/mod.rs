//! Domain types for liquidity analytics.
//!
//! - [`DatedSeries`]: Ordered, validated series of optional values
//! - [`Observation`]: A single dated value
//! - [`Frequency`]: Sampling frequency and its conventional period constants
//! - [`Classified`]: A categorical result or an explicit insufficient-data marker

mod classified;
mod frequency;
mod series;

pub use classified::Classified;
pub use frequency::Frequency;
pub use series::{DatedSeries, Observation};
