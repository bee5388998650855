//! Health-factor computation.
//!
//! The health factor is the threshold-adjusted collateral value over
//! outstanding debt, at the 18-decimal scale. A factor of exactly the
//! minimum passes; only strictly-below breaks.

use crate::core::ledger::{DebtAmount, UsdValue};
use crate::error::{Error, Result};
use crate::utils::constants::*;
use crate::utils::math::mul_div;

/// Health factor for a position with `collateral_usd` backing `debt`.
///
/// A position with no debt is maximally healthy by definition. Factors too
/// large to represent saturate to the maximum.
pub fn health_factor(
    collateral_usd: UsdValue,
    debt: DebtAmount,
    threshold_pct: u128,
) -> Result<u128> {
    if debt.is_zero() {
        return Ok(MAX_HEALTH_FACTOR);
    }

    let adjusted = mul_div(collateral_usd.raw(), threshold_pct, PCT_DIVISOR)?;
    Ok(mul_div(adjusted, FIXED_POINT_SCALE, debt.raw()).unwrap_or(MAX_HEALTH_FACTOR))
}

/// Whether `factor` clears the minimum (boundary inclusive)
pub fn is_healthy(factor: u128, min_health_factor: u128) -> bool {
    factor >= min_health_factor
}

/// Fail with [`Error::HealthFactorBroken`] unless `factor` clears the minimum
pub fn assert_healthy(factor: u128, min_health_factor: u128) -> Result<()> {
    if !is_healthy(factor, min_health_factor) {
        return Err(Error::HealthFactorBroken { factor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_debt_is_maximally_healthy() {
        let factor = health_factor(
            UsdValue::ZERO,
            DebtAmount::ZERO,
            LIQUIDATION_THRESHOLD_PCT,
        )
        .unwrap();
        assert_eq!(factor, MAX_HEALTH_FACTOR);
    }

    #[test]
    fn test_concrete_factor() {
        // $20,000 collateral, 2,000 debt: (20000 * 50/100) * 1e18 / 2000 = 5e18
        let factor = health_factor(
            UsdValue::from_whole(20_000),
            DebtAmount::from_whole(2_000),
            LIQUIDATION_THRESHOLD_PCT,
        )
        .unwrap();
        assert_eq!(factor, 5 * FIXED_POINT_SCALE);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        // $20,000 collateral, 10,000 debt: factor is exactly 1.0
        let factor = health_factor(
            UsdValue::from_whole(20_000),
            DebtAmount::from_whole(10_000),
            LIQUIDATION_THRESHOLD_PCT,
        )
        .unwrap();
        assert_eq!(factor, MIN_HEALTH_FACTOR);
        assert!(is_healthy(factor, MIN_HEALTH_FACTOR));
        assert!(assert_healthy(factor, MIN_HEALTH_FACTOR).is_ok());

        // One raw unit of extra debt breaks the position
        let factor = health_factor(
            UsdValue::from_whole(20_000),
            DebtAmount::from_raw(10_000 * FIXED_POINT_SCALE + 1),
            LIQUIDATION_THRESHOLD_PCT,
        )
        .unwrap();
        assert!(factor < MIN_HEALTH_FACTOR);
        assert_eq!(
            assert_healthy(factor, MIN_HEALTH_FACTOR).unwrap_err(),
            Error::HealthFactorBroken { factor }
        );
    }

    #[test]
    fn test_factor_saturates() {
        // Enormous collateral against one raw unit of debt saturates
        let factor = health_factor(
            UsdValue::from_raw(u128::MAX / 2),
            DebtAmount::from_raw(1),
            LIQUIDATION_THRESHOLD_PCT,
        )
        .unwrap();
        assert_eq!(factor, MAX_HEALTH_FACTOR);
    }
}
