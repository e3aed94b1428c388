//! # Reservoir Core
//!
//! Core types for the Reservoir systemic liquidity analytics library.
//!
//! This crate provides the foundational building blocks used throughout Reservoir:
//!
//! - **Types**: [`DatedSeries`], [`Observation`], [`Frequency`], [`Classified`]
//! - **Indicators**: [`IndicatorConfig`] and the built-in indicator catalogs
//! - **Errors**: [`ReservoirError`] for caller contract violations
//!
//! ## Design Philosophy
//!
//! - **Immutable inputs**: series are validated once at construction and never mutated
//! - **Explicit missing data**: `Option<f64>` everywhere, never zero or NaN
//! - **Contract violations fail loudly**: unsorted or duplicate timestamps are errors,
//!   missing values are not
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use reservoir_core::prelude::*;
//!
//! let dates = vec![
//!     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
//! ];
//! let reserves = DatedSeries::new("reserves", dates, vec![Some(3_400.0), None]).unwrap();
//!
//! assert_eq!(reserves.len(), 2);
//! assert_eq!(reserves.latest_valid().map(|o| o.value), Some(3_400.0));
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
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod indicators;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ReservoirError, ReservoirResult};
    pub use crate::indicators::{
        DataSource, IndicatorCatalog, IndicatorCategory, IndicatorConfig,
    };
    pub use crate::types::{Classified, DatedSeries, Frequency, Observation};
}

// Re-export commonly used types at crate root
pub use error::{ReservoirError, ReservoirResult};
pub use types::{Classified, DatedSeries, Frequency, Observation};
