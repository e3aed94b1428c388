//! All seven balance-sheet metrics evaluated in one pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use reservoir_core::{Classified, DatedSeries, Frequency, ReservoirResult};

use super::{
    demand_proxy, lending_stress, money_market_stress, qt_pace, reserve_regime, tga_drag,
    verify_identity, DemandProxyReading, IdentityInputs, IdentityReading, LendingStressReading,
    MoneyMarketReading, QtPaceReading, ReadingSeries, ReserveRegimeReading, TgaDragReading,
};
use crate::config::EngineConfig;
use crate::error::{AnalyticsResult, Validate};
use crate::parallel::maybe_parallel_map;

/// Balance-sheet series for the dashboard. Every series is optional; each
/// metric degrades to insufficient data when one of its inputs is absent.
#[derive(Debug, Clone, Default)]
pub struct BalanceSheetInputs {
    /// Sampling frequency shared by the series.
    pub frequency: Frequency,
    /// Fed total assets (SOMA proxy).
    pub fed_assets: Option<DatedSeries>,
    /// Reserve balances.
    pub reserves: Option<DatedSeries>,
    /// Overnight reverse repo.
    pub reverse_repo: Option<DatedSeries>,
    /// Treasury General Account.
    pub tga: Option<DatedSeries>,
    /// Fed lending facilities.
    pub fed_lending: Option<DatedSeries>,
}

impl BalanceSheetInputs {
    /// Creates an empty bundle at `frequency`.
    #[must_use]
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    /// Sets total assets.
    #[must_use]
    pub fn with_fed_assets(mut self, series: DatedSeries) -> Self {
        self.fed_assets = Some(series);
        self
    }

    /// Sets reserve balances.
    #[must_use]
    pub fn with_reserves(mut self, series: DatedSeries) -> Self {
        self.reserves = Some(series);
        self
    }

    /// Sets the reverse repo balance.
    #[must_use]
    pub fn with_reverse_repo(mut self, series: DatedSeries) -> Self {
        self.reverse_repo = Some(series);
        self
    }

    /// Sets the TGA balance.
    #[must_use]
    pub fn with_tga(mut self, series: DatedSeries) -> Self {
        self.tga = Some(series);
        self
    }

    /// Sets Fed lending.
    #[must_use]
    pub fn with_fed_lending(mut self, series: DatedSeries) -> Self {
        self.fed_lending = Some(series);
        self
    }

    fn series(&self) -> [Option<&DatedSeries>; 5] {
        [
            self.fed_assets.as_ref(),
            self.reserves.as_ref(),
            self.reverse_repo.as_ref(),
            self.tga.as_ref(),
            self.fed_lending.as_ref(),
        ]
    }

    /// Latest timestamp across the supplied series.
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.series()
            .into_iter()
            .flatten()
            .filter_map(|s| s.dates().last().copied())
            .max()
    }

    /// The bundle restricted to observations on or before `as_of`.
    #[must_use]
    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        let cut = |s: &Option<DatedSeries>| s.as_ref().map(|s| s.truncate_to(as_of));
        Self {
            frequency: self.frequency,
            fed_assets: cut(&self.fed_assets),
            reserves: cut(&self.reserves),
            reverse_repo: cut(&self.reverse_repo),
            tga: cut(&self.tga),
            fed_lending: cut(&self.fed_lending),
        }
    }
}

/// Latest reading of every balance-sheet metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetDashboard {
    /// Latest timestamp among the inputs.
    pub as_of: Option<NaiveDate>,
    /// QT pace
    pub qt_pace: Classified<QtPaceReading>,
    /// Reserve regime
    pub reserve_regime: Classified<ReserveRegimeReading>,
    /// Balance-sheet identity check
    pub identity: Classified<IdentityReading>,
    /// Money-market stress
    pub money_market: Classified<MoneyMarketReading>,
    /// Fed lending stress
    pub lending_stress: Classified<LendingStressReading>,
    /// TGA reserve drag
    pub tga_drag: Classified<TgaDragReading>,
    /// Reserve demand proxy
    pub demand_proxy: Classified<DemandProxyReading>,
}

fn latest<R>(readings: ReadingSeries<R>) -> Classified<R> {
    readings
        .into_iter()
        .next_back()
        .map_or(Classified::InsufficientData, |obs| obs.value)
}

/// Aligns the named inputs; `None` if any is absent.
fn aligned<const N: usize>(series: [Option<&DatedSeries>; N]) -> Option<[DatedSeries; N]> {
    let present: Vec<&DatedSeries> = series.into_iter().collect::<Option<_>>()?;
    DatedSeries::align(&present).try_into().ok()
}

impl BalanceSheetDashboard {
    /// Evaluates every metric on the latest common observation of its inputs.
    pub fn evaluate(inputs: &BalanceSheetInputs, config: &EngineConfig) -> AnalyticsResult<Self> {
        config.validate_or_error()?;
        Ok(Self::evaluate_unchecked(inputs, config)?)
    }

    /// Evaluates the dashboard as it stood on each of `dates`.
    ///
    /// Results are in the order of `dates`.
    pub fn evaluate_as_of(
        inputs: &BalanceSheetInputs,
        config: &EngineConfig,
        dates: &[NaiveDate],
    ) -> AnalyticsResult<Vec<Self>> {
        config.validate_or_error()?;
        let results = maybe_parallel_map(dates, &config.evaluation, |date| {
            Self::evaluate_unchecked(&inputs.truncate_to(*date), config)
        });
        Ok(results.into_iter().collect::<ReservoirResult<Vec<_>>>()?)
    }

    fn evaluate_unchecked(inputs: &BalanceSheetInputs, config: &EngineConfig) -> ReservoirResult<Self> {
        let frequency = inputs.frequency;

        let qt_pace = match &inputs.fed_assets {
            Some(assets) => latest(qt_pace(assets, frequency, &config.qt_pace)?),
            None => Classified::InsufficientData,
        };

        let reserve_regime = match (&inputs.reserves, &inputs.reverse_repo) {
            (Some(reserves), Some(rrp)) => match aligned([Some(reserves), Some(rrp)]) {
                Some([reserves, rrp]) => {
                    latest(reserve_regime(&reserves, Some(&rrp), &config.reserve_regime)?)
                }
                None => Classified::InsufficientData,
            },
            (Some(reserves), None) => latest(reserve_regime(reserves, None, &config.reserve_regime)?),
            (None, _) => Classified::InsufficientData,
        };

        let identity = match aligned([
            inputs.reserves.as_ref(),
            inputs.fed_assets.as_ref(),
            inputs.fed_lending.as_ref(),
            inputs.reverse_repo.as_ref(),
            inputs.tga.as_ref(),
        ]) {
            Some([reserves, soma_assets, fed_lending, reverse_repo, tga]) => {
                let components = IdentityInputs {
                    reserves: &reserves,
                    soma_assets: &soma_assets,
                    fed_lending: &fed_lending,
                    reverse_repo: &reverse_repo,
                    tga: &tga,
                };
                latest(verify_identity(&components, &config.identity)?)
            }
            None => Classified::InsufficientData,
        };

        let money_market = match &inputs.reverse_repo {
            Some(rrp) => latest(money_market_stress(rrp, frequency, &config.money_market)?),
            None => Classified::InsufficientData,
        };

        let lending_stress = match &inputs.fed_lending {
            Some(lending) => latest(lending_stress(lending, frequency, &config.lending_stress)?),
            None => Classified::InsufficientData,
        };

        let tga_drag = match aligned([inputs.tga.as_ref(), inputs.reserves.as_ref()]) {
            Some([tga, reserves]) => latest(tga_drag(&tga, &reserves, &config.tga_drag)?),
            None => Classified::InsufficientData,
        };

        let demand_proxy = match aligned([inputs.reverse_repo.as_ref(), inputs.reserves.as_ref()]) {
            Some([rrp, reserves]) => latest(demand_proxy(&rrp, &reserves, &config.demand_proxy)?),
            None => Classified::InsufficientData,
        };

        let dashboard = Self {
            as_of: inputs.latest_date(),
            qt_pace,
            reserve_regime,
            identity,
            money_market,
            lending_stress,
            tga_drag,
            demand_proxy,
        };
        let missing = dashboard.insufficient_metrics();
        if !missing.is_empty() {
            log::debug!("insufficient data for {}", missing.join(", "));
        }
        Ok(dashboard)
    }

    /// Names of the metrics that could not be evaluated.
    #[must_use]
    pub fn insufficient_metrics(&self) -> Vec<&'static str> {
        [
            ("qt_pace", self.qt_pace.is_insufficient()),
            ("reserve_regime", self.reserve_regime.is_insufficient()),
            ("identity", self.identity.is_insufficient()),
            ("money_market", self.money_market.is_insufficient()),
            ("lending_stress", self.lending_stress.is_insufficient()),
            ("tga_drag", self.tga_drag.is_insufficient()),
            ("demand_proxy", self.demand_proxy.is_insufficient()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BalanceSheetPhase, ReserveRegime, StressLevel};
    use chrono::Duration;

    fn weekly(name: &str, n: usize, f: impl Fn(usize) -> f64) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        DatedSeries::from_values(
            name,
            (0..n).map(|i| (start + Duration::weeks(i as i64), f(i))),
        )
        .unwrap()
    }

    fn inputs() -> BalanceSheetInputs {
        BalanceSheetInputs::new(Frequency::Weekly)
            .with_fed_assets(weekly("walcl", 120, |i| 8900.0 - 5.0 * i as f64))
            .with_reserves(weekly("wresbal", 120, |i| 3400.0 - 4.0 * i as f64))
            .with_reverse_repo(weekly("rrp", 120, |i| 2200.0 - 10.0 * i as f64))
            .with_tga(weekly("tga", 120, |i| 500.0 + (i % 4) as f64 * 25.0))
            .with_fed_lending(weekly("lending", 120, |i| 20.0 + (i % 7) as f64))
    }

    #[test]
    fn test_evaluate_all_metrics() {
        let dashboard = BalanceSheetDashboard::evaluate(&inputs(), &EngineConfig::default()).unwrap();
        assert!(dashboard.insufficient_metrics().is_empty());

        let qt = dashboard.qt_pace.level().unwrap();
        assert_eq!(qt.phase, BalanceSheetPhase::Contraction);

        // 3400 - 4 * 119 = 2924, net of 10% of RRP (1010)
        let regime = dashboard.reserve_regime.level().unwrap();
        assert_eq!(regime.regime, ReserveRegime::Abundant);

        let demand = dashboard.demand_proxy.level().unwrap();
        assert!(!demand.crisis_indicator);
        assert_eq!(dashboard.as_of, Some(NaiveDate::from_ymd_opt(2024, 4, 17).unwrap()));
    }

    #[test]
    fn test_missing_inputs_degrade_independently() {
        let partial = BalanceSheetInputs::new(Frequency::Weekly)
            .with_reserves(weekly("wresbal", 10, |_| 1200.0));
        let dashboard = BalanceSheetDashboard::evaluate(&partial, &EngineConfig::default()).unwrap();
        assert_eq!(
            dashboard.reserve_regime.level().unwrap().regime,
            ReserveRegime::Tight
        );
        assert_eq!(dashboard.insufficient_metrics().len(), 6);
    }

    #[test]
    fn test_evaluate_as_of() {
        let inputs = inputs();
        let dates: Vec<NaiveDate> = inputs.fed_assets.as_ref().unwrap().dates()[100..].to_vec();
        let history =
            BalanceSheetDashboard::evaluate_as_of(&inputs, &EngineConfig::default(), &dates).unwrap();
        assert_eq!(history.len(), dates.len());
        for (dashboard, date) in history.iter().zip(&dates) {
            assert_eq!(dashboard.as_of, Some(*date));
        }
        assert!(matches!(
            history[0].money_market.level().map(|r| r.level),
            Some(StressLevel::Normal | StressLevel::Elevated | StressLevel::Stress)
        ));
    }
}
