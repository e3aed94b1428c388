//! Indicator definitions and the built-in catalogs.
//!
//! An [`IndicatorConfig`] is read-only metadata describing one observable: where
//! it comes from, which category it belongs to, how often it is sampled and
//! whether higher raw values mean *lower* risk (`invert`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::Frequency;

/// Upstream source of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// FRED economic data
    Fred,
    /// Yahoo Finance market data
    YFinance,
    /// User-supplied CSV
    Csv,
}

/// Analytical category of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    /// Central-bank and commercial-bank balance sheet items
    BalanceSheet,
    /// Credit spreads
    Spread,
    /// Collateral values and volatility
    Collateral,
    /// Market-implied beliefs (real yields, breakevens)
    Belief,
    /// Household and corporate leverage
    Leverage,
}

impl fmt::Display for IndicatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorCategory::BalanceSheet => "Balance Sheet",
            IndicatorCategory::Spread => "Spread",
            IndicatorCategory::Collateral => "Collateral",
            IndicatorCategory::Belief => "Belief",
            IndicatorCategory::Leverage => "Leverage",
        };
        write!(f, "{name}")
    }
}

/// Metadata for a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Stable key used to look the indicator up (e.g. `reserve_balances`).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Upstream source.
    pub source: DataSource,
    /// Source-specific ticker or series id.
    pub ticker: String,
    /// Analytical category.
    pub category: IndicatorCategory,
    /// True if higher raw values denote lower risk.
    #[serde(default)]
    pub invert: bool,
    /// Native sampling frequency.
    #[serde(default)]
    pub frequency: Frequency,
}

impl IndicatorConfig {
    /// Creates an indicator definition.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        source: DataSource,
        ticker: impl Into<String>,
        category: IndicatorCategory,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            source,
            ticker: ticker.into(),
            category,
            invert: false,
            frequency: Frequency::Daily,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the indicator as inverted (higher value = lower risk).
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Sets the native frequency.
    #[must_use]
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Orients a 0-100 score so that higher always means more risk.
    ///
    /// Inverted indicators are mirrored around 50.
    #[must_use]
    pub fn orient(&self, score: f64) -> f64 {
        if self.invert {
            100.0 - score
        } else {
            score
        }
    }
}

/// A keyed, read-only collection of indicator definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCatalog {
    indicators: BTreeMap<String, IndicatorConfig>,
}

impl IndicatorCatalog {
    /// Builds a catalog from definitions; later duplicates replace earlier ones.
    #[must_use]
    pub fn from_configs(configs: impl IntoIterator<Item = IndicatorConfig>) -> Self {
        let indicators = configs
            .into_iter()
            .map(|config| (config.key.clone(), config))
            .collect();
        Self { indicators }
    }

    /// Looks an indicator up by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IndicatorConfig> {
        self.indicators.get(key)
    }

    /// Number of indicators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Iterates over indicators in key order.
    pub fn iter(&self) -> impl Iterator<Item = &IndicatorConfig> {
        self.indicators.values()
    }

    /// Iterates over the indicators of one category.
    pub fn by_category(
        &self,
        category: IndicatorCategory,
    ) -> impl Iterator<Item = &IndicatorConfig> {
        self.indicators
            .values()
            .filter(move |config| config.category == category)
    }

    /// Merges another catalog into this one.
    #[must_use]
    pub fn merged(mut self, other: IndicatorCatalog) -> Self {
        self.indicators.extend(other.indicators);
        self
    }

    /// The minimum indicator set needed for regime and alert evaluation.
    #[must_use]
    pub fn minimum() -> Self {
        use DataSource::{Fred, YFinance};
        use IndicatorCategory::{BalanceSheet, Belief, Collateral, Spread};

        Self::from_configs([
            IndicatorConfig::new("fed_assets", "Fed Total Assets", Fred, "WALCL", BalanceSheet)
                .with_description("Central bank balance sheet, the root of system liquidity")
                .inverted()
                .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "reserve_balances",
                "Reserve Balances with Fed",
                Fred,
                "WRESBAL",
                BalanceSheet,
            )
            .with_description("Bank reserves held at the Fed")
            .inverted()
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "reverse_repo",
                "Overnight Reverse Repo (Treasury)",
                Fred,
                "RRPONTSYD",
                BalanceSheet,
            )
            .with_description("Overnight liquidity absorbed at the RRP facility"),
            IndicatorConfig::new(
                "tga_balance",
                "Treasury General Account",
                Fred,
                "WTREGEN",
                BalanceSheet,
            )
            .with_description("Treasury cash at the Fed; build-ups drain reserves")
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "fed_lending",
                "Fed Lending (Combined)",
                Fred,
                "WLCFLPCL",
                BalanceSheet,
            )
            .with_description("Fed lending facilities, a credit-pressure gauge")
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "bank_credit",
                "Commercial Bank Credit",
                Fred,
                "TOTBKCR",
                BalanceSheet,
            )
            .with_description("Private credit creation by commercial banks")
            .inverted()
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new("m2", "M2 Money Supply", Fred, "M2SL", BalanceSheet)
                .with_description("Broad money in circulation")
                .inverted()
                .with_frequency(Frequency::Monthly),
            IndicatorConfig::new("hy_spread", "High Yield Spread", Fred, "BAMLH0A0HYM2", Spread)
                .with_description("High yield credit risk premium"),
            IndicatorConfig::new(
                "ig_spread",
                "Investment Grade Spread",
                Fred,
                "BAMLC0A0CM",
                Spread,
            )
            .with_description("Investment grade corporate funding cost"),
            IndicatorConfig::new("vix", "VIX", YFinance, "^VIX", Collateral)
                .with_description("Equity implied volatility"),
            IndicatorConfig::new("real_yield_10y", "10Y Real Yield", Fred, "DFII10", Belief)
                .with_description("Real discount rate for risk assets"),
            IndicatorConfig::new("sp500", "S&P 500", YFinance, "^GSPC", Collateral)
                .with_description("US large cap equity index")
                .inverted(),
            IndicatorConfig::new(
                "breakeven_10y",
                "10Y Breakeven Inflation",
                Fred,
                "T10YIE",
                Belief,
            )
            .with_description("Market-implied inflation expectations"),
        ])
    }

    /// Additional indicators for deeper monitoring.
    #[must_use]
    pub fn extended() -> Self {
        use DataSource::{Fred, YFinance};
        use IndicatorCategory::{BalanceSheet, Collateral, Leverage};

        Self::from_configs([
            IndicatorConfig::new("move", "MOVE Index", YFinance, "^MOVE", Collateral)
                .with_description("Treasury implied volatility"),
            IndicatorConfig::new("fci", "Financial Conditions Index", Fred, "NFCI", BalanceSheet)
                .with_description("Composite financial conditions")
                .with_frequency(Frequency::Weekly),
            IndicatorConfig::new("consumer_credit", "Consumer Credit", Fred, "TOTALSL", Leverage)
                .with_description("Household leverage")
                .with_frequency(Frequency::Monthly),
            IndicatorConfig::new("repo_rate", "Repo Rate", Fred, "SOFR", BalanceSheet)
                .with_description("Overnight secured funding cost"),
        ])
    }

    /// Components of the Fed balance-sheet identity.
    #[must_use]
    pub fn balance_sheet_identity() -> Self {
        use DataSource::Fred;
        use IndicatorCategory::BalanceSheet;

        Self::from_configs([
            IndicatorConfig::new(
                "fed_soma_assets",
                "Fed SOMA Assets (Total Assets proxy)",
                Fred,
                "WALCL",
                BalanceSheet,
            )
            .inverted()
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new("fed_reserves", "Fed Reserve Balances", Fred, "WRESBAL", BalanceSheet)
                .inverted()
                .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "reverse_repo_rrp",
                "Reverse Repo Agreements",
                Fred,
                "RRPONTSYD",
                BalanceSheet,
            ),
            IndicatorConfig::new(
                "treasury_general_acct",
                "Treasury General Account (TGA)",
                Fred,
                "WTREGEN",
                BalanceSheet,
            )
            .with_frequency(Frequency::Weekly),
            IndicatorConfig::new(
                "fed_lending_total",
                "Fed Lending Facilities",
                Fred,
                "WLCFLPCL",
                BalanceSheet,
            )
            .with_frequency(Frequency::Weekly),
        ])
    }

    /// Every built-in indicator.
    #[must_use]
    pub fn all() -> Self {
        Self::minimum()
            .merged(Self::extended())
            .merged(Self::balance_sheet_identity())
    }
}
