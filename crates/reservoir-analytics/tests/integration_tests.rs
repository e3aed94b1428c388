//! Integration tests for reservoir-analytics.
//!
//! End-to-end scenarios from raw series through metrics, regime
//! classification and alerting.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use chrono::{Duration, NaiveDate};
use reservoir_analytics::metrics::{
    demand_proxy, qt_pace, reserve_regime, verify_identity, IdentityConfig, IdentityInputs,
    QtPaceConfig, ReserveRegimeConfig,
};
use reservoir_analytics::prelude::*;
use reservoir_core::{DatedSeries, Frequency};

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn weekly(name: &str, values: &[f64]) -> DatedSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    DatedSeries::from_values(
        name,
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::weeks(i as i64), *v)),
    )
    .unwrap()
}

fn daily(name: &str, n: usize, f: impl Fn(usize) -> f64) -> DatedSeries {
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    DatedSeries::from_values(name, (0..n).map(|i| (start + Duration::days(i as i64), f(i)))).unwrap()
}

fn collateral_snapshot(equity_return: f64) -> SignalSnapshot {
    SignalSnapshot::new()
        .with(Signal::VolatilityPercentile, 95.0)
        .with(Signal::SpreadPercentile, 80.0)
        .with(Signal::EquityReturn1mPct, equity_return)
        .with(Signal::ValuationZscoreChange, 0.1)
        .with(Signal::EarningsZscoreChange, 0.0)
        .with(Signal::CreditGrowthAnnualizedPct, 3.0)
        .with(Signal::SpreadChange, 0.2)
}

// =============================================================================
// METRIC SCENARIOS
// =============================================================================

#[test]
fn test_qt_pace_over_one_month() {
    let assets = weekly("walcl", &[8500.0, 8475.0, 8450.0, 8425.0, 8400.0]);
    let pace = qt_pace(&assets, Frequency::Weekly, &QtPaceConfig::default()).unwrap();

    let latest = pace.last().unwrap().value.level().unwrap();
    assert_abs_diff_eq!(latest.pace_pct, -1.18, epsilon = 0.005);
    assert_eq!(latest.phase, reservoir_analytics::metrics::BalanceSheetPhase::Contraction);
}

#[test]
fn test_reserve_band_boundaries() {
    let config = ReserveRegimeConfig::default();
    let reserves = weekly("wresbal", &[2500.0, 2500.01, 1500.0, 500.0, 499.0]);
    let bands: Vec<_> = reserve_regime(&reserves, None, &config)
        .unwrap()
        .into_iter()
        .map(|obs| obs.value.level().unwrap().regime)
        .collect();

    assert_eq!(
        bands,
        vec![
            ReserveRegime::Ample,
            ReserveRegime::Abundant,
            ReserveRegime::Tight,
            ReserveRegime::Scarce,
            ReserveRegime::Scarce,
        ]
    );
}

#[test]
fn test_identity_balanced_and_perturbed() {
    // ΔReserves = ΔSOMA + ΔLending - ΔRRP - ΔTGA by construction
    let soma = [8000.0, 7950.0, 7900.0, 7880.0];
    let lending = [10.0, 12.0, 11.0, 11.0];
    let rrp = [500.0, 480.0, 470.0, 450.0];
    let tga = [700.0, 720.0, 690.0, 700.0];
    let reserves: Vec<f64> = (0..4)
        .map(|i| {
            3000.0 + (soma[i] - soma[0]) + (lending[i] - lending[0])
                - (rrp[i] - rrp[0])
                - (tga[i] - tga[0])
        })
        .collect();

    let soma = weekly("soma", &soma);
    let lending = weekly("lending", &lending);
    let rrp = weekly("rrp", &rrp);
    let tga = weekly("tga", &tga);
    let config = IdentityConfig::default();

    let balanced = weekly("wresbal", &reserves);
    let inputs = IdentityInputs {
        reserves: &balanced,
        soma_assets: &soma,
        fed_lending: &lending,
        reverse_repo: &rrp,
        tga: &tga,
    };
    let readings = verify_identity(&inputs, &config).unwrap();
    assert!(readings[0].value.is_insufficient());
    for obs in &readings[1..] {
        let reading = obs.value.level().unwrap();
        assert_abs_diff_eq!(reading.residual, 0.0, epsilon = 1e-9);
        assert!(reading.balanced);
    }

    let mut shifted = reserves.clone();
    shifted[3] += 37.5;
    let perturbed = weekly("wresbal", &shifted);
    let inputs = IdentityInputs {
        reserves: &perturbed,
        ..inputs
    };
    let readings = verify_identity(&inputs, &config).unwrap();
    let reading = readings[3].value.level().unwrap();
    assert_abs_diff_eq!(reading.residual, 37.5, epsilon = 1e-9);
    assert!(!reading.balanced);
}

#[test]
fn test_demand_proxy_half_and_crisis() {
    let rrp = weekly("rrp", &[1800.0, 2000.0]);
    let reserves = weekly("wresbal", &[1800.0, 1500.0]);
    let readings = demand_proxy(&rrp, &reserves, &Default::default()).unwrap();

    let equal = readings[0].value.level().unwrap();
    assert_eq!(equal.ratio, 0.5);
    assert!(!equal.crisis_indicator);

    let crisis = readings[1].value.level().unwrap();
    assert!(crisis.ratio > 0.5);
    assert!(crisis.crisis_indicator);
    assert_eq!(crisis.level, StressLevel::Stress);
}

#[test]
fn test_misaligned_inputs_are_errors() {
    let rrp = weekly("rrp", &[1800.0, 2000.0]);
    let reserves = weekly("wresbal", &[1800.0, 1500.0, 1400.0]);
    assert!(demand_proxy(&rrp, &reserves, &Default::default()).is_err());
}

// =============================================================================
// REGIME SCENARIOS
// =============================================================================

#[test]
fn test_confidence_extremes() {
    let classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();

    let agree = FactorScores::new()
        .with(Factor::CreditGrowth, 45.0)
        .with(Factor::SpreadTightness, 45.0)
        .with(Factor::Volatility, 45.0)
        .with(Factor::ValuationGap, 45.0);
    let result = classifier.classify(&agree).unwrap();
    assert_relative_eq!(result.confidence.unwrap(), 1.0);
    assert_eq!(result.primary.level(), Some(&MacroRegime::LateCycle));

    let split = FactorScores::new()
        .with(Factor::CreditGrowth, 0.0)
        .with(Factor::SpreadTightness, 0.0)
        .with(Factor::Volatility, 100.0)
        .with(Factor::ValuationGap, 100.0);
    let result = classifier.classify(&split).unwrap();
    assert_abs_diff_eq!(result.confidence.unwrap(), 0.0, epsilon = 1e-12);
    assert!(result.low_confidence);
    // Volatility at 100 trips the veto
    assert!(result.volatility_veto);
    assert_eq!(result.primary.level(), Some(&MacroRegime::Stress));
}

#[test]
fn test_regime_from_raw_series() {
    // Three years of daily data with stress building at the end
    let n = 800;
    let stressed = |i: usize, calm: f64, peak: f64| if i + 20 >= n { peak } else { calm + (i % 5) as f64 };
    let inputs = FactorInputs::default()
        .with_spread(daily("hy", n, |i| stressed(i, 3.0, 9.0)), Frequency::Daily)
        .with_volatility(daily("vix", n, |i| stressed(i, 15.0, 45.0)), Frequency::Daily)
        .with_real_yield(daily("dfii10", n, |i| stressed(i, 1.0, 3.0)), Frequency::Daily);

    let scores = FactorBuilder::default().build(&inputs).unwrap();
    assert_eq!(scores.len(), 3);
    assert!(scores.get(Factor::Volatility).unwrap() > 95.0);

    let result = RegimeClassifier::new(RegimeConfig::default())
        .unwrap()
        .classify(&scores)
        .unwrap();
    assert_eq!(result.primary.level(), Some(&MacroRegime::Stress));
    assert!(result.data_quality_warning.is_some());
}

#[test]
fn test_too_few_factors_is_insufficient() {
    let classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
    let scores = FactorScores::new()
        .with(Factor::CreditGrowth, 40.0)
        .with(Factor::Volatility, 50.0);
    let result = classifier.classify(&scores).unwrap();
    assert!(result.primary.is_insufficient());
    assert!(result.composite.is_none());
}

// =============================================================================
// ALERT SCENARIOS
// =============================================================================

#[test]
fn test_collateral_stress_scenario() {
    let engine = AlertEngine::with_default_rules();

    let fired = engine.evaluate(&collateral_snapshot(-7.0));
    let ids: Vec<&str> = fired.iter().map(|a| a.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["collateral_stress"]);
    assert_eq!(fired[0].severity, Severity::Action);

    // Other rules are unaffected by the equity return
    let quiet = engine.evaluate(&collateral_snapshot(-2.0));
    assert!(quiet.is_empty());
}

#[test]
fn test_missing_signal_never_fires() {
    let engine = AlertEngine::with_default_rules();
    let snapshot = SignalSnapshot::new()
        .with(Signal::VolatilityPercentile, 99.0)
        .with(Signal::SpreadPercentile, 99.0);
    assert!(engine.evaluate(&snapshot).is_empty());
}

#[test]
fn test_alerts_from_raw_series() {
    let n = 800;
    let crash = |i: usize, calm: f64, peak: f64| if i + 10 >= n { peak } else { calm + (i % 3) as f64 };
    let inputs = SignalInputs::default()
        .with_volatility(daily("vix", n, |i| crash(i, 15.0, 50.0)), Frequency::Daily)
        .with_spread(daily("hy", n, |i| crash(i, 3.0, 8.0)), Frequency::Daily)
        .with_equity(
            daily("spx", n, |i| if i + 10 >= n { 4500.0 } else { 5000.0 }),
            Frequency::Daily,
        );

    let snapshot = SignalBuilder::default().build(&inputs).unwrap();
    assert_relative_eq!(snapshot.get(Signal::EquityReturn1mPct).unwrap(), -10.0, epsilon = 1e-9);

    let alerts = AlertEngine::with_default_rules().evaluate(&snapshot);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule_id, "collateral_stress");
    assert_eq!(alerts[0].as_of, snapshot.as_of());
    assert_eq!(AlertSummary::from_alerts(&alerts).highest(), Some(Severity::Action));
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_engine_config_round_trip() {
    let config = EngineConfig::default();

    let yaml = serde_yaml::to_string(&config).unwrap();
    let from_yaml: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(from_yaml, config);

    let json = serde_json::to_string_pretty(&config).unwrap();
    let from_json: EngineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, config);
    assert!(from_json.is_valid());
}

#[test]
fn test_custom_rules_from_yaml() {
    let yaml = r#"
alert_rules:
  - id: spread_blowout
    title: Spread blowout
    severity: watch
    condition:
      type: any
      conditions:
        - { type: above, signal: spread_percentile, threshold: 95 }
        - { type: above, signal: spread_change, threshold: 1.0 }
    description_template: "Spreads at {spread_percentile} pctile"
"#;
    let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(config.is_valid());

    let engine = AlertEngine::new(config.alert_rules).unwrap();
    let alerts = engine.evaluate(&SignalSnapshot::new().with(Signal::SpreadChange, 1.4));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].description, "Spreads at n/a pctile");
}
