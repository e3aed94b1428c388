//! Factor scores from raw series.
//!
//! Each factor is reduced to a risk-oriented 0-100 score from the transforms
//! of its source series:
//!
//! | Factor | Score |
//! |--------|-------|
//! | Credit growth | percentile of the annualized 3M change, inverted |
//! | Spread | percentile of the spread level |
//! | Volatility | percentile of the volatility index |
//! | Valuation gap | `100 × Φ(z_valuation - z_earnings)` |
//! | Real yield | percentile of the real yield level |
//!
//! Percentile factors follow the orientation of their indicator in the
//! [`IndicatorCatalog`]. Percentiles and z-scores use a trailing window that
//! needs to be at least half filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

use reservoir_core::indicators::IndicatorCatalog;
use reservoir_core::{DatedSeries, Frequency, Observation, ReservoirResult};
use reservoir_math::transforms::{
    annualized_short_term_change, percentile_rank_with, rolling_zscore_with,
};
use reservoir_math::RollingWindow;

use super::{Factor, FactorObservation, FactorScores};
use crate::error::{Validate, ValidationError};

/// Factor construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    /// Trailing window for percentiles and z-scores.
    pub window_years: usize,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self { window_years: 3 }
    }
}

impl FactorConfig {
    /// Sets the trailing window.
    #[must_use]
    pub fn with_window_years(mut self, years: usize) -> Self {
        self.window_years = years;
        self
    }
}

impl Validate for FactorConfig {
    fn validate(&self) -> Vec<ValidationError> {
        if self.window_years == 0 {
            vec![ValidationError::new("window_years", "must be positive")]
        } else {
            Vec::new()
        }
    }
}

/// A series with its sampling frequency.
#[derive(Debug, Clone)]
pub struct SeriesInput {
    /// The series
    pub series: DatedSeries,
    /// Its frequency
    pub frequency: Frequency,
}

impl SeriesInput {
    /// Pairs a series with its frequency.
    #[must_use]
    pub fn new(series: DatedSeries, frequency: Frequency) -> Self {
        Self { series, frequency }
    }
}

/// Source series for the factors. Any may be absent.
#[derive(Debug, Clone, Default)]
pub struct FactorInputs {
    /// Bank credit level
    pub credit: Option<SeriesInput>,
    /// Credit spread level
    pub spread: Option<SeriesInput>,
    /// Volatility index
    pub volatility: Option<SeriesInput>,
    /// Valuation measure (e.g. equity index or P/E)
    pub valuation: Option<SeriesInput>,
    /// Earnings measure
    pub earnings: Option<SeriesInput>,
    /// Real yield level
    pub real_yield: Option<SeriesInput>,
}

impl FactorInputs {
    /// Sets the credit series.
    #[must_use]
    pub fn with_credit(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.credit = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the spread series.
    #[must_use]
    pub fn with_spread(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.spread = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the volatility series.
    #[must_use]
    pub fn with_volatility(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.volatility = Some(SeriesInput::new(series, frequency));
        self
    }

    /// Sets the valuation and earnings series.
    #[must_use]
    pub fn with_valuation(
        mut self,
        valuation: DatedSeries,
        earnings: DatedSeries,
        frequency: Frequency,
    ) -> Self {
        self.valuation = Some(SeriesInput::new(valuation, frequency));
        self.earnings = Some(SeriesInput::new(earnings, frequency));
        self
    }

    /// Sets the real yield series.
    #[must_use]
    pub fn with_real_yield(mut self, series: DatedSeries, frequency: Frequency) -> Self {
        self.real_yield = Some(SeriesInput::new(series, frequency));
        self
    }
}

/// Standard normal CDF.
fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Builds [`FactorScores`] from raw series.
#[derive(Debug, Clone)]
pub struct FactorBuilder {
    config: FactorConfig,
    catalog: IndicatorCatalog,
    as_of: Option<NaiveDate>,
}

impl Default for FactorBuilder {
    fn default() -> Self {
        Self::new(FactorConfig::default())
    }
}

impl FactorBuilder {
    /// Creates a builder oriented by the built-in catalog.
    #[must_use]
    pub fn new(config: FactorConfig) -> Self {
        Self {
            config,
            catalog: IndicatorCatalog::all(),
            as_of: None,
        }
    }

    /// Replaces the catalog used to orient scores.
    #[must_use]
    pub fn with_catalog(mut self, catalog: IndicatorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Evaluates as of `date`, ignoring later observations.
    #[must_use]
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    fn window(&self, frequency: Frequency) -> ReservoirResult<RollingWindow> {
        let window = RollingWindow::years(self.config.window_years, frequency.periods_per_year())?;
        Ok(window.half_filled())
    }

    fn prepare(&self, series: &DatedSeries) -> DatedSeries {
        match self.as_of {
            Some(date) => series.truncate_to(date),
            None => series.clone(),
        }
    }

    /// Mirrors the score when the factor's indicator falls as risk rises.
    fn orient(&self, factor: Factor, observation: Observation<f64>) -> Observation<f64> {
        match factor.indicator().and_then(|key| self.catalog.get(key)) {
            Some(config) => Observation::new(observation.date, config.orient(observation.value)),
            None => observation,
        }
    }

    fn percentile(&self, input: &SeriesInput) -> ReservoirResult<Option<Observation<f64>>> {
        let series = self.prepare(&input.series);
        Ok(percentile_rank_with(&series, self.window(input.frequency)?)?.latest_valid())
    }

    fn credit(&self, input: &SeriesInput) -> ReservoirResult<Option<Observation<f64>>> {
        let series = self.prepare(&input.series);
        let frequency = input.frequency;
        let growth = annualized_short_term_change(
            &series,
            frequency.periods_per_quarter(),
            frequency.periods_per_year(),
        )?;
        Ok(percentile_rank_with(&growth, self.window(frequency)?)?.latest_valid())
    }

    fn valuation_gap(
        &self,
        valuation: &SeriesInput,
        earnings: &SeriesInput,
    ) -> ReservoirResult<Option<Observation<f64>>> {
        let z_val = rolling_zscore_with(
            &self.prepare(&valuation.series),
            self.window(valuation.frequency)?,
        )?;
        let z_earn = rolling_zscore_with(
            &self.prepare(&earnings.series),
            self.window(earnings.frequency)?,
        )?;
        let Ok([z_val, z_earn]) = <[DatedSeries; 2]>::try_from(DatedSeries::align(&[&z_val, &z_earn]))
        else {
            return Ok(None);
        };
        let gap = z_val.zip_with(&z_earn, "valuation_gap", |v, e| Some(v - e))?;
        Ok(gap
            .latest_valid()
            .map(|obs| Observation::new(obs.date, 100.0 * normal_cdf(obs.value))))
    }

    /// Computes every factor whose inputs are present and long enough.
    pub fn build(&self, inputs: &FactorInputs) -> ReservoirResult<FactorScores> {
        let mut scores = FactorScores::new();
        let mut record = |factor: Factor, observation: Option<Observation<f64>>| match observation {
            Some(obs) => {
                let obs = self.orient(factor, obs);
                scores.insert(
                    factor,
                    FactorObservation {
                        score: obs.value.clamp(0.0, 100.0),
                        as_of: Some(obs.date),
                    },
                );
            }
            None => log::debug!("factor {} unavailable", factor.key()),
        };

        record(
            Factor::CreditGrowth,
            inputs.credit.as_ref().map(|i| self.credit(i)).transpose()?.flatten(),
        );
        record(
            Factor::SpreadTightness,
            inputs.spread.as_ref().map(|i| self.percentile(i)).transpose()?.flatten(),
        );
        record(
            Factor::Volatility,
            inputs.volatility.as_ref().map(|i| self.percentile(i)).transpose()?.flatten(),
        );
        let gap = match (&inputs.valuation, &inputs.earnings) {
            (Some(valuation), Some(earnings)) => self.valuation_gap(valuation, earnings)?,
            _ => None,
        };
        record(Factor::ValuationGap, gap);
        record(
            Factor::RealYield,
            inputs.real_yield.as_ref().map(|i| self.percentile(i)).transpose()?.flatten(),
        );

        Ok(scores)
    }
}
