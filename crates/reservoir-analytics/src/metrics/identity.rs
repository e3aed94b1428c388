//! Reserve balance-sheet identity.
//!
//! On the Fed balance sheet, reserve changes are explained by asset and
//! liability movements:
//!
//! ```text
//! ΔReserves = ΔSOMA + ΔLending - ΔRRP - ΔTGA
//! ```
//!
//! Components are published on different schedules and revised, so the
//! residual is measurement noise to be judged against a tolerance, not a
//! hard invariant.

use serde::{Deserialize, Serialize};

use reservoir_core::{Classified, DatedSeries, ReservoirError, ReservoirResult};
use reservoir_math::transforms::difference;

use super::{all_finite, readings, ReadingSeries};
use crate::error::{check_finite, Validate, ValidationError};

/// Identity check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Lag over which component changes are taken.
    pub periods: usize,
    /// Minimum scale for the relative residual, in billions.
    pub scale_floor: f64,
    /// Relative residual below which the identity counts as balanced.
    pub relative_tolerance: f64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            periods: 1,
            scale_floor: 50.0,
            relative_tolerance: 0.05,
        }
    }
}

impl IdentityConfig {
    /// Sets the differencing lag.
    #[must_use]
    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    /// Sets the balanced tolerance.
    #[must_use]
    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }
}

impl Validate for IdentityConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.periods == 0 {
            errors.push(ValidationError::new("periods", "must be positive"));
        }
        check_finite(&mut errors, "scale_floor", self.scale_floor);
        if self.scale_floor <= 0.0 {
            errors.push(ValidationError::new("scale_floor", "must be positive"));
        }
        check_finite(&mut errors, "relative_tolerance", self.relative_tolerance);
        if self.relative_tolerance <= 0.0 {
            errors.push(ValidationError::new("relative_tolerance", "must be positive"));
        }
        errors
    }
}

/// Component changes over one differencing period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentityDeltas {
    /// ΔReserves (left-hand side)
    pub reserves: f64,
    /// ΔSOMA / total assets
    pub soma_assets: f64,
    /// ΔFed lending
    pub fed_lending: f64,
    /// ΔReverse repo
    pub reverse_repo: f64,
    /// ΔTGA
    pub tga: f64,
}

impl IdentityDeltas {
    /// `ΔSOMA + ΔLending - ΔRRP - ΔTGA`.
    #[must_use]
    pub fn rhs(&self) -> f64 {
        self.soma_assets + self.fed_lending - self.reverse_repo - self.tga
    }
}

/// The five component series, all sharing the same timestamps.
#[derive(Debug, Clone, Copy)]
pub struct IdentityInputs<'a> {
    /// Reserve balances
    pub reserves: &'a DatedSeries,
    /// SOMA holdings or total assets
    pub soma_assets: &'a DatedSeries,
    /// Fed lending facilities
    pub fed_lending: &'a DatedSeries,
    /// Overnight reverse repo
    pub reverse_repo: &'a DatedSeries,
    /// Treasury General Account
    pub tga: &'a DatedSeries,
}

impl IdentityInputs<'_> {
    fn components(&self) -> [&DatedSeries; 5] {
        [
            self.reserves,
            self.soma_assets,
            self.fed_lending,
            self.reverse_repo,
            self.tga,
        ]
    }

    /// Fails unless every component shares the reserves timestamps.
    pub fn ensure_aligned(&self) -> ReservoirResult<()> {
        self.components()
            .iter()
            .skip(1)
            .try_for_each(|series| self.reserves.ensure_aligned(series))
    }
}

/// Result of one identity check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentityReading {
    /// Component changes used.
    pub deltas: IdentityDeltas,
    /// ΔReserves.
    pub lhs: f64,
    /// ΔSOMA + ΔLending - ΔRRP - ΔTGA.
    pub rhs: f64,
    /// `lhs - rhs`.
    pub residual: f64,
    /// `|residual| / max(|lhs|, scale_floor)`.
    pub relative_residual: f64,
    /// True if the relative residual is within tolerance.
    pub balanced: bool,
}

/// Checks the identity for one set of component changes.
pub fn identity_reading(deltas: IdentityDeltas, config: &IdentityConfig) -> Classified<IdentityReading> {
    let IdentityDeltas {
        reserves,
        soma_assets,
        fed_lending,
        reverse_repo,
        tga,
    } = deltas;
    if !all_finite(&[reserves, soma_assets, fed_lending, reverse_repo, tga]) {
        return Classified::InsufficientData;
    }

    let lhs = reserves;
    let rhs = deltas.rhs();
    let residual = lhs - rhs;
    let relative_residual = residual.abs() / lhs.abs().max(config.scale_floor);

    Classified::Level(IdentityReading {
        deltas,
        lhs,
        rhs,
        residual,
        relative_residual,
        balanced: relative_residual < config.relative_tolerance,
    })
}

/// Checks the identity at every timestamp.
///
/// The first `periods` timestamps, and any whose differenced components are
/// missing, are insufficient.
pub fn verify_identity(
    inputs: &IdentityInputs<'_>,
    config: &IdentityConfig,
) -> ReservoirResult<ReadingSeries<IdentityReading>> {
    inputs.ensure_aligned()?;
    let periods = ReservoirError::require_positive("periods", config.periods)?;

    let [reserves, soma, lending, rrp, tga] = inputs.components().map(|s| difference(s, periods));
    let (reserves, soma, lending, rrp, tga) = (reserves?, soma?, lending?, rrp?, tga?);

    let deltas_at = |t: usize| -> Option<IdentityDeltas> {
        Some(IdentityDeltas {
            reserves: reserves.value(t)?,
            soma_assets: soma.value(t)?,
            fed_lending: lending.value(t)?,
            reverse_repo: rrp.value(t)?,
            tga: tga.value(t)?,
        })
    };

    Ok(readings(&reserves, |t| {
        deltas_at(t).map_or(Classified::InsufficientData, |deltas| {
            identity_reading(deltas, config)
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn weekly(name: &str, values: &[f64]) -> DatedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        DatedSeries::from_values(
            name,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + chrono::Duration::weeks(i as i64), *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_balanced_by_construction() {
        // ΔSOMA = -60, ΔLending = +5, ΔRRP = -20, ΔTGA = +15 -> ΔReserves = -50
        let deltas = IdentityDeltas {
            reserves: -50.0,
            soma_assets: -60.0,
            fed_lending: 5.0,
            reverse_repo: -20.0,
            tga: 15.0,
        };
        let reading = identity_reading(deltas, &IdentityConfig::default()).into_level().unwrap();
        assert_abs_diff_eq!(reading.residual, 0.0, epsilon = 1e-12);
        assert!(reading.balanced);
    }

    #[test]
    fn test_scale_floor_bounds_small_lhs() {
        let deltas = IdentityDeltas {
            reserves: 1.0,
            soma_assets: 0.0,
            fed_lending: 0.0,
            reverse_repo: 0.0,
            tga: 0.0,
        };
        let reading = identity_reading(deltas, &IdentityConfig::default()).into_level().unwrap();
        assert_abs_diff_eq!(reading.relative_residual, 1.0 / 50.0, epsilon = 1e-12);
        assert!(reading.balanced);
    }

    #[test]
    fn test_verify_identity_series() {
        let reserves = weekly("reserves", &[3000.0, 2950.0, 2900.0]);
        let soma = weekly("soma", &[7000.0, 6940.0, 6880.0]);
        let lending = weekly("lending", &[100.0, 105.0, 110.0]);
        let rrp = weekly("rrp", &[500.0, 480.0, 460.0]);
        let tga = weekly("tga", &[700.0, 715.0, 730.0]);
        let inputs = IdentityInputs {
            reserves: &reserves,
            soma_assets: &soma,
            fed_lending: &lending,
            reverse_repo: &rrp,
            tga: &tga,
        };

        let checks = verify_identity(&inputs, &IdentityConfig::default()).unwrap();
        assert!(checks[0].value.is_insufficient());
        for check in &checks[1..] {
            let reading = check.value.level().unwrap();
            assert_abs_diff_eq!(reading.residual, 0.0, epsilon = 1e-9);
            assert!(reading.balanced);
        }
    }

    #[test]
    fn test_misaligned_components_rejected() {
        let reserves = weekly("reserves", &[3000.0, 2950.0]);
        let short = weekly("soma", &[7000.0]);
        let inputs = IdentityInputs {
            reserves: &reserves,
            soma_assets: &short,
            fed_lending: &reserves,
            reverse_repo: &reserves,
            tga: &reserves,
        };
        assert!(verify_identity(&inputs, &IdentityConfig::default()).is_err());
    }
}
