//! # Reservoir Analytics
//!
//! Liquidity stress metrics, macro regime classification and alerting.
//!
//! This crate provides:
//!
//! - **Metrics**: QT pace, reserve regime, balance-sheet identity, money-market
//!   stress, Fed lending stress, TGA drag and the reserve-demand proxy
//! - **Regime**: weighted five-factor classification with confidence and an
//!   ordered explanation
//! - **Alerts**: configurable rules over derived signals
//! - **Config**: one serde-friendly [`EngineConfig`](config::EngineConfig) with
//!   documented defaults and validation
//!
//! ## Missing data
//!
//! A metric whose inputs are absent or too short returns
//! [`Classified::InsufficientData`](reservoir_core::Classified); an alert rule
//! whose signals are missing does not fire. Only contract violations such as
//! misaligned series or invalid configuration are errors.
//!
//! ## Example
//!
//! ```rust
//! use reservoir_analytics::prelude::*;
//!
//! let classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
//! let scores = FactorScores::new()
//!     .with(Factor::CreditGrowth, 20.0)
//!     .with(Factor::SpreadTightness, 25.0)
//!     .with(Factor::Volatility, 15.0)
//!     .with(Factor::ValuationGap, 30.0)
//!     .with(Factor::RealYield, 20.0);
//!
//! let result = classifier.classify(&scores).unwrap();
//! assert_eq!(result.primary.level(), Some(&MacroRegime::Expansion));
//! assert!(!result.low_confidence);
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
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

pub mod alerts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parallel;
pub mod regime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::alerts::{
        default_rules, Alert, AlertEngine, AlertRule, AlertSummary, Condition, Severity, Signal,
        SignalBuilder, SignalInputs, SignalSnapshot,
    };
    pub use crate::config::{EngineConfig, EvaluationConfig};
    pub use crate::error::{AnalyticsError, AnalyticsResult, Validate, ValidationError};
    pub use crate::metrics::{
        BalanceSheetDashboard, BalanceSheetInputs, DragRegime, ReserveRegime, StressLevel,
    };
    pub use crate::regime::{
        Factor, FactorBuilder, FactorInputs, FactorScores, MacroRegime, RegimeClassification,
        RegimeClassifier, RegimeConfig, SeriesInput,
    };
}

pub use error::{AnalyticsError, AnalyticsResult};
