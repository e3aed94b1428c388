//! Derived signals the alert rules are written against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use reservoir_core::{DatedSeries, Frequency, Observation, ReservoirResult};
use reservoir_math::transforms::{
    annualized_short_term_change, difference, percentile_rank_with, period_change,
    rolling_zscore_with,
};
use reservoir_math::RollingWindow;

use crate::error::{AnalyticsError, Validate, ValidationError};
use crate::regime::SeriesInput;

/// A named input to alert conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// One-month change in the valuation z-score
    ValuationZscoreChange,
    /// One-month change in the earnings z-score
    EarningsZscoreChange,
    /// Volatility trailing percentile, 0-100
    VolatilityPercentile,
    /// Spread trailing percentile, 0-100
    SpreadPercentile,
    /// Equity one-month return in percent
    #[serde(rename = "equity_return_1m_pct")]
    EquityReturn1mPct,
    /// Bank credit annualized 3M growth in percent
    CreditGrowthAnnualizedPct,
    /// One-month change in the spread level
    SpreadChange,
}

impl Signal {
    /// Every signal.
    pub const ALL: [Signal; 7] = [
        Signal::ValuationZscoreChange,
        Signal::EarningsZscoreChange,
        Signal::VolatilityPercentile,
        Signal::SpreadPercentile,
        Signal::EquityReturn1mPct,
        Signal::CreditGrowthAnnualizedPct,
        Signal::SpreadChange,
    ];

    /// Stable key, also the template placeholder name.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Signal::ValuationZscoreChange => "valuation_zscore_change",
            Signal::EarningsZscoreChange => "earnings_zscore_change",
            Signal::VolatilityPercentile => "volatility_percentile",
            Signal::SpreadPercentile => "spread_percentile",
            Signal::EquityReturn1mPct => "equity_return_1m_pct",
            Signal::CreditGrowthAnnualizedPct => "credit_growth_annualized_pct",
            Signal::SpreadChange => "spread_change",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Signal {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Signal::ALL
            .into_iter()
            .find(|signal| signal.key() == key)
            .ok_or_else(|| AnalyticsError::invalid_config("signal", format!("unknown signal '{key}'")))
    }
}

/// Latest signal values. Absent signals are missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    values: BTreeMap<Signal, f64>,
    as_of: Option<NaiveDate>,
}

impl SignalSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value; non-finite values are treated as missing.
    #[must_use]
    pub fn with(mut self, signal: Signal, value: f64) -> Self {
        self.insert(signal, value);
        self
    }

    /// Sets the snapshot date.
    #[must_use]
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Inserts a value; non-finite values are treated as missing.
    pub fn insert(&mut self, signal: Signal, value: f64) {
        if value.is_finite() {
            self.values.insert(signal, value);
        }
    }

    /// Value of one signal.
    #[must_use]
    pub fn get(&self, signal: Signal) -> Option<f64> {
        self.values.get(&signal).copied()
    }

    /// Snapshot date, the newest observation it was built from.
    #[must_use]
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    /// Number of present signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no signal is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over present signals.
    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.values.iter().map(|(s, v)| (*s, *v))
    }
}

/// Signal construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Window for the valuation and earnings z-scores.
    pub zscore_window_years: usize,
    /// Window for the volatility and spread percentiles.
    pub percentile_window_years: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            zscore_window_years: 3,
            percentile_window_years: 3,
        }
    }
}

impl Validate for SignalConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.zscore_window_years == 0 {
            errors.push(ValidationError::new("zscore_window_years", "must be positive"));
        }
        if self.percentile_window_years == 0 {
            errors.push(ValidationError::new("percentile_window_years", "must be positive"));
        }
        errors
    }
}

/// Source series for the signals. Any may be absent.
#[derive(Debug, Clone, Default)]
pub struct SignalInputs {
    /// Valuation measure
    pub valuation: Option<SeriesInput>,
    /// Earnings measure
    pub earnings: Option<SeriesInput>,
    /// Volatility index
    pub volatility: Option<SeriesInput>,
    /// Credit spread level
    pub spread: Option<SeriesInput>,
    /// Equity index
    pub equity: Option<SeriesInput>,
    /// Bank credit level
    pub credit: Option<SeriesInput>,
}

impl SignalInputs {
    /// Sets the valuation series.
    #[must_use]
    pub fn with_valuation(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.valuation = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the earnings series.
    #[must_use]
    pub fn with_earnings(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.earnings = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the volatility series.
    #[must_use]
    pub fn with_volatility(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.volatility = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the spread series.
    #[must_use]
    pub fn with_spread(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.spread = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the equity series.
    #[must_use]
    pub fn with_equity(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.equity = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the bank credit series.
    #[must_use]
    pub fn with_credit(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.credit = Some(SeriesInput::new(series, frequency));
        self
    }
}

/// Builds a [`SignalSnapshot`] from raw series.
#[derive(Debug, Clone, Default)]
pub struct SignalBuilder {
    config: SignalConfig,
    as_of: Option<NaiveDate>,
}

type Latest = ReservoirResult<Option<Observation<f64>>>;

impl SignalBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(config: SignalConfig) -> Self {
        Self { config, as_of: None }
    }

    /// Evaluates as of `date`, ignoring later observations.
    #[must_use]
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    fn prepare(&self, input: &SeriesInput) -> DatedSeries {
        match self.as_of {
            Some(date) => input.series.truncate_to(date),
            None => input.series.clone(),
        }
    }

    fn window(years: usize, frequency: Frequency) -> ReservoirResult<RollingWindow> {
        Ok(RollingWindow::years(years, frequency.periods_per_year())?.half_filled())
    }

    fn zscore_change(&self, input: &SeriesInput) -> Latest {
        let series = self.prepare(input);
        let window = Self::window(self.config.zscore_window_years, input.frequency)?;
        let zscore = rolling_zscore_with(&series, window)?;
        Ok(difference(&zscore, input.frequency.periods_per_month())?.latest_valid())
    }

    fn percentile(&self, input: &SeriesInput) -> Latest {
        let series = self.prepare(input);
        let window = Self::window(self.config.percentile_window_years, input.frequency)?;
        Ok(percentile_rank_with(&series, window)?.latest_valid())
    }

    fn equity_return(&self, input: &SeriesInput) -> Latest {
        let change = period_change(&self.prepare(input), input.frequency.periods_per_month())?;
        Ok(change.latest_valid().map(|o| Observation::new(o.date, o.value * 100.0)))
    }

    fn credit_growth(&self, input: &SeriesInput) -> Latest {
        let growth = annualized_short_term_change(
            &self.prepare(input),
            input.frequency.periods_per_quarter(),
            input.frequency.periods_per_year(),
        )?;
        Ok(growth.latest_valid().map(|o| Observation::new(o.date, o.value * 100.0)))
    }

    fn spread_change(&self, input: &SeriesInput) -> Latest {
        let change = difference(&self.prepare(input), input.frequency.periods_per_month())?;
        Ok(change.latest_valid())
    }

    /// Computes every signal whose inputs are present and long enough.
    pub fn build(&self, inputs: &SignalInputs) -> ReservoirResult<SignalSnapshot> {
        let computed: [(Signal, Option<&SeriesInput>, fn(&Self, &SeriesInput) -> Latest); 7] = [
            (Signal::ValuationZscoreChange, inputs.valuation.as_ref(), Self::zscore_change),
            (Signal::EarningsZscoreChange, inputs.earnings.as_ref(), Self::zscore_change),
            (Signal::VolatilityPercentile, inputs.volatility.as_ref(), Self::percentile),
            (Signal::SpreadPercentile, inputs.spread.as_ref(), Self::percentile),
            (Signal::EquityReturn1mPct, inputs.equity.as_ref(), Self::equity_return),
            (Signal::CreditGrowthAnnualizedPct, inputs.credit.as_ref(), Self::credit_growth),
            (Signal::SpreadChange, inputs.spread.as_ref(), Self::spread_change),
        ];

        let mut snapshot = SignalSnapshot::new();
        for (signal, input, compute) in computed {
            let Some(input) = input else {
                continue;
            };
            match compute(self, input)? {
                Some(obs) => {
                    snapshot.insert(signal, obs.value);
                    snapshot.as_of = snapshot.as_of.max(Some(obs.date));
                }
                None => log::debug!("signal {} has too little history", signal.key()),
            }
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn daily(name: &str, n: usize, f: impl Fn(usize) -> f64) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        DatedSeries::from_values(name, (0..n).map(|i| (start + Duration::days(i as i64), f(i))))
            .unwrap()
    }

    #[test]
    fn test_signal_keys_round_trip() {
        for signal in Signal::ALL {
            assert_eq!(signal.key().parse::<Signal>().unwrap(), signal);
        }
        assert!("vix".parse::<Signal>().is_err());
    }

    #[test]
    fn test_snapshot_ignores_non_finite() {
        let snapshot = SignalSnapshot::new()
            .with(Signal::SpreadChange, f64::NAN)
            .with(Signal::SpreadPercentile, 80.0);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get(Signal::SpreadChange).is_none());
    }

    #[test]
    fn test_equity_return_in_percent() {
        // Falls 7% over the last 21 sessions
        let equity = daily("spx", 60, |i| if i < 39 { 100.0 } else { 93.0 });
        let inputs = SignalInputs::default().with_equity(equity, Frequency::Daily);
        let snapshot = SignalBuilder::default().build(&inputs).unwrap();
        assert_relative_eq!(snapshot.get(Signal::EquityReturn1mPct).unwrap(), -7.0, epsilon = 1e-9);
        assert_eq!(snapshot.as_of(), NaiveDate::from_ymd_opt(2022, 3, 3));
    }

    #[test]
    fn test_short_history_leaves_signals_missing() {
        let vix = daily("vix", 30, |i| 15.0 + (i % 5) as f64);
        let inputs = SignalInputs::default()
            .with_volatility(vix.clone(), Frequency::Daily)
            .with_spread(vix, Frequency::Daily);
        let snapshot = SignalBuilder::default().build(&inputs).unwrap();
        assert!(snapshot.get(Signal::VolatilityPercentile).is_none());
        assert!(snapshot.get(Signal::SpreadChange).is_some());
    }
}
