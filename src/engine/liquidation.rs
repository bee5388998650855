//! Trust-minimized liquidation of under-collateralized positions.
//!
//! A liquidation is a single atomic step with no persisted intermediate
//! state: precondition check, seizure valuation, collateral seizure, debt
//! retirement, and post-condition checks all commit or roll back together.
//! The liquidator pays `debt_to_cover` in debt claims and receives the
//! equivalent collateral plus a bonus.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::ledger::{AccountId, AssetId, CollateralAmount, DebtAmount};
use crate::engine::events::EngineEvent;
use crate::engine::{health, Engine};
use crate::error::{Error, Result};
use crate::external::custody::CollateralCustody;
use crate::external::token::DebtToken;
use crate::utils::math::percentage;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOME & STATISTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a completed liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Debt retired from the target
    pub debt_covered: DebtAmount,
    /// Collateral seized in total, bonus included
    pub collateral_seized: CollateralAmount,
    /// Bonus portion of the seizure
    pub bonus: CollateralAmount,
    /// Target health factor observed at the precondition check
    pub health_factor_before: u128,
    /// Target health factor after seizure and retirement
    pub health_factor_after: u128,
}

/// Aggregate liquidation statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationStats {
    /// Number of completed liquidations
    pub total_liquidations: u64,
    /// Debt retired across all liquidations
    pub total_debt_retired: DebtAmount,
    /// Collateral seized across all liquidations
    pub total_collateral_seized: CollateralAmount,
}

/// Total seizure and bonus for a base seizure amount
fn seizure_amounts(
    seized_base: CollateralAmount,
    bonus_pct: u128,
) -> Result<(CollateralAmount, CollateralAmount)> {
    let bonus = CollateralAmount::from_raw(percentage(seized_base.raw(), bonus_pct)?);
    let total = seized_base.checked_add(bonus).ok_or(Error::Overflow {
        operation: "liquidation seizure".into(),
    })?;
    Ok((total, bonus))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

impl<T: DebtToken, C: CollateralCustody> Engine<T, C> {
    /// Liquidate `target`'s under-collateralized position.
    ///
    /// `liquidator` pays `debt_to_cover` in debt claims and receives the
    /// equivalent amount of `asset` plus the configured bonus. The call
    /// fails with [`Error::HealthFactorOk`] against a healthy target and
    /// with [`Error::HealthFactorNotImproved`] when the seizure would not
    /// strictly improve the target's factor; either way, no state persists.
    pub fn liquidate(
        &mut self,
        liquidator: AccountId,
        target: AccountId,
        asset: AssetId,
        debt_to_cover: DebtAmount,
    ) -> Result<LiquidationOutcome> {
        self.unit_of_work("liquidate", |engine| {
            engine.liquidate_inner(liquidator, target, asset, debt_to_cover)
        })
    }

    fn liquidate_inner(
        &mut self,
        liquidator: AccountId,
        target: AccountId,
        asset: AssetId,
        debt_to_cover: DebtAmount,
    ) -> Result<LiquidationOutcome> {
        if debt_to_cover.is_zero() {
            return Err(Error::InvalidAmount);
        }
        self.registry.require_supported(&asset)?;

        let before = self.health_factor(&target)?;
        if health::is_healthy(before, self.params.min_health_factor) {
            return Err(Error::HealthFactorOk { factor: before });
        }

        let seized_base = self.token_amount_from_usd(&asset, debt_to_cover.as_usd())?;
        let (total_seized, bonus) =
            seizure_amounts(seized_base, self.params.liquidation_bonus_pct)?;

        // Seizure past the target's remaining collateral fails fast. A
        // position whose bonus-inflated seizure exceeds its collateral is
        // unliquidatable through this protocol; that is an accepted edge of
        // the economic design, not clamped away here.
        self.ledger.sub_collateral(&target, &asset, total_seized)?;
        self.ledger.sub_debt(&target, debt_to_cover)?;

        let after = self.health_factor(&target)?;
        if after <= before {
            return Err(Error::HealthFactorNotImproved { before, after });
        }

        // The liquidator's own position is never touched above; the check
        // is carried from the reference design regardless.
        let liquidator_factor = self.health_factor(&liquidator)?;
        health::assert_healthy(liquidator_factor, self.params.min_health_factor)?;

        let timestamp = self.clock.unix_now();
        self.events.push(EngineEvent::CollateralRedeemed {
            from: target,
            to: liquidator,
            asset,
            amount: total_seized,
            timestamp,
        });
        self.events.push(EngineEvent::DebtBurned {
            payer: liquidator,
            on_behalf_of: target,
            amount: debt_to_cover,
            timestamp,
        });
        self.events.push(EngineEvent::PositionLiquidated {
            liquidator,
            target,
            asset,
            debt_covered: debt_to_cover,
            collateral_seized: total_seized,
            bonus,
            health_factor_before: before,
            health_factor_after: after,
            timestamp,
        });

        // Externals last: claims inward, collateral outward.
        self.retire_claims(&liquidator, debt_to_cover)?;
        if !self.custody.release(&liquidator, &asset, total_seized) {
            error!(%liquidator, %asset, "collateral release failed after claim burn; external supply may be inconsistent");
            return Err(Error::TransferFailed(format!(
                "collateral release of {} {} to {}",
                total_seized, asset, liquidator
            )));
        }

        self.liquidation_stats.total_liquidations += 1;
        self.liquidation_stats.total_debt_retired = self
            .liquidation_stats
            .total_debt_retired
            .saturating_add(debt_to_cover);
        self.liquidation_stats.total_collateral_seized = self
            .liquidation_stats
            .total_collateral_seized
            .saturating_add(total_seized);

        info!(
            %liquidator, %target, %asset, %debt_to_cover, %total_seized,
            "position liquidated"
        );

        Ok(LiquidationOutcome {
            debt_covered: debt_to_cover,
            collateral_seized: total_seized,
            bonus,
            health_factor_before: before,
            health_factor_after: after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{alice, bob, harness, weth};
    use crate::utils::constants::FIXED_POINT_SCALE;
    use crate::utils::time::Clock;

    /// Alice at the maximum mint against 10 units at $2,000
    fn harness_with_max_position() -> crate::engine::tests::Harness {
        let mut h = harness();
        h.engine
            .deposit_and_mint(
                alice(),
                weth(),
                CollateralAmount::from_whole(10),
                DebtAmount::from_whole(10_000),
            )
            .unwrap();
        h
    }

    fn fund_liquidator(h: &mut crate::engine::tests::Harness, debt: u128) {
        h.engine
            .deposit_and_mint(
                bob(),
                weth(),
                CollateralAmount::from_whole(40),
                DebtAmount::from_whole(debt),
            )
            .unwrap();
    }

    #[test]
    fn test_liquidate_healthy_position_rejected() {
        let mut h = harness_with_max_position();

        let err = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(1_000))
            .unwrap_err();
        assert!(matches!(err, Error::HealthFactorOk { .. }));
    }

    #[test]
    fn test_liquidate_zero_amount_rejected() {
        let mut h = harness_with_max_position();
        assert_eq!(
            h.engine
                .liquidate(bob(), alice(), weth(), DebtAmount::ZERO)
                .unwrap_err(),
            Error::InvalidAmount
        );
    }

    #[test]
    fn test_partial_liquidation_improves_target() {
        let mut h = harness_with_max_position();
        fund_liquidator(&mut h, 5_000);

        // Price drops to $1,800: alice's factor is 0.9
        h.price.set_price(1_800_00000000, h.clock.unix_now());
        let before = h.engine.health_factor(&alice()).unwrap();
        assert!(before < FIXED_POINT_SCALE);

        let outcome = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(5_000))
            .unwrap();

        assert_eq!(outcome.debt_covered, DebtAmount::from_whole(5_000));
        assert!(outcome.health_factor_after > outcome.health_factor_before);
        assert_eq!(outcome.health_factor_before, before);

        // Debt attribution reduced by exactly the covered amount
        assert_eq!(h.engine.debt_of(&alice()), DebtAmount::from_whole(5_000));

        // Seizure is base + 10%: 5000/1800 * 1.1 units
        let expected_base = 5_000u128 * FIXED_POINT_SCALE / 1_800;
        assert_eq!(outcome.collateral_seized.raw(), expected_base + expected_base / 10);
        assert_eq!(outcome.bonus.raw(), expected_base / 10);

        // Liquidator received the seized collateral in their wallet
        assert_eq!(
            h.engine.custody().balance_of(&bob(), &weth()),
            CollateralAmount::from_raw(
                60 * FIXED_POINT_SCALE + expected_base + expected_base / 10
            )
        );

        let stats = h.engine.liquidation_stats();
        assert_eq!(stats.total_liquidations, 1);
        assert_eq!(stats.total_debt_retired, DebtAmount::from_whole(5_000));
    }

    #[test]
    fn test_full_liquidation_clears_debt() {
        let mut h = harness_with_max_position();
        fund_liquidator(&mut h, 10_000);

        h.price.set_price(1_800_00000000, h.clock.unix_now());
        let outcome = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(10_000))
            .unwrap();

        assert!(h.engine.debt_of(&alice()).is_zero());
        assert_eq!(outcome.health_factor_after, u128::MAX);
    }

    #[test]
    fn test_liquidation_not_improving_rolls_back() {
        let mut h = harness_with_max_position();

        // At $1,050 collateral value is below debt + bonus, so seizing
        // worsens the target's factor
        h.price.set_price(1_050_00000000, h.clock.unix_now());
        let hash_before = h.engine.state_hash();
        let events_before = h.engine.events().len();

        let err = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(5_000))
            .unwrap_err();
        assert!(matches!(err, Error::HealthFactorNotImproved { .. }));

        assert_eq!(h.engine.state_hash(), hash_before);
        assert_eq!(h.engine.events().len(), events_before);
        assert_eq!(h.engine.liquidation_stats().total_liquidations, 0);
    }

    #[test]
    fn test_bonus_exceeding_collateral_is_unliquidatable() {
        let mut h = harness_with_max_position();

        // Covering the full debt at $1,050 needs ~10.48 units against 10
        h.price.set_price(1_050_00000000, h.clock.unix_now());
        let err = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(10_000))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientCollateral { .. }));
    }

    #[test]
    fn test_liquidator_without_claims_rolls_back() {
        let mut h = harness_with_max_position();

        h.price.set_price(1_800_00000000, h.clock.unix_now());
        let hash_before = h.engine.state_hash();

        // Bob holds no debt claims, so the pull fails after all checks
        let err = h
            .engine
            .liquidate(bob(), alice(), weth(), DebtAmount::from_whole(5_000))
            .unwrap_err();
        assert!(matches!(err, Error::TransferFailed(_)));
        assert_eq!(h.engine.state_hash(), hash_before);
        assert_eq!(h.engine.debt_of(&alice()), DebtAmount::from_whole(10_000));
    }

    #[test]
    fn test_seizure_amounts() {
        let (total, bonus) =
            seizure_amounts(CollateralAmount::from_whole(10), 10).unwrap();
        assert_eq!(bonus, CollateralAmount::from_whole(1));
        assert_eq!(total, CollateralAmount::from_whole(11));
    }
}
