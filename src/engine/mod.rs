//! The vaultUSD engine: guarded entry points over the global ledger.
//!
//! Every state-changing entry point runs as one serialized, all-or-nothing
//! unit of work:
//!
//! 1. acquire the non-reentrant guard (nested entry fails with
//!    `ReentrancyRejected`),
//! 2. snapshot the ledger and mark the event log,
//! 3. apply internal effects and every post-condition check,
//! 4. perform external interactions last,
//! 5. on any failure, restore the snapshot and truncate rolled-back events.
//!
//! External interactions are ordered value-inward before value-outward;
//! custody pulls are compensated by a release when a later external step
//! fails.

pub mod events;
pub mod health;
pub mod liquidation;
pub mod valuation;

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::core::config::{AssetRegistry, EngineParams};
use crate::core::ledger::{
    AccountId, AssetId, CollateralAmount, DebtAmount, GlobalLedger, StateHash, UsdValue,
};
use crate::error::{Error, Result};
use crate::external::custody::CollateralCustody;
use crate::external::oracle::PriceSource;
use crate::external::token::DebtToken;
use crate::storage::{self, StorageBackend};
use crate::utils::guard::ReentrancyGuard;
use crate::utils::math::checked_add;
use crate::utils::time::Clock;

pub use events::{EngineEvent, EventLog};
pub use liquidation::{LiquidationOutcome, LiquidationStats};

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral-backed debt engine.
///
/// Owns the [`GlobalLedger`] exclusively and reaches its collaborators only
/// through the narrow capabilities in [`crate::external`].
pub struct Engine<T: DebtToken, C: CollateralCustody> {
    params: EngineParams,
    registry: AssetRegistry,
    oracles: HashMap<AssetId, Box<dyn PriceSource>>,
    ledger: GlobalLedger,
    debt_token: T,
    custody: C,
    clock: Box<dyn Clock>,
    guard: ReentrancyGuard,
    events: EventLog,
    liquidation_stats: LiquidationStats,
}

impl<T: DebtToken, C: CollateralCustody> Engine<T, C> {
    /// Construct an engine from parallel asset/oracle lists and its
    /// collaborator bindings.
    ///
    /// Fails with [`Error::ConfigMismatch`] on a list-length mismatch. All
    /// bindings are immutable for the engine's lifetime.
    pub fn new(
        params: EngineParams,
        assets: Vec<AssetId>,
        oracles: Vec<Box<dyn PriceSource>>,
        debt_token: T,
        custody: C,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        params.validate()?;
        let (registry, oracles) = AssetRegistry::from_parallel_lists(assets, oracles)?;

        Ok(Self {
            params,
            registry,
            oracles,
            ledger: GlobalLedger::new(),
            debt_token,
            custody,
            clock,
            guard: ReentrancyGuard::new(),
            events: EventLog::new(),
            liquidation_stats: LiquidationStats::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNIT OF WORK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run `f` as one guarded, all-or-nothing unit of work.
    pub(crate) fn unit_of_work<R>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let _token = self.guard.enter()?;
        let snapshot = self.ledger.snapshot();
        let event_mark = self.events.mark();

        match f(self) {
            Ok(result) => Ok(result),
            Err(e) => {
                self.ledger.restore(snapshot);
                self.events.rollback_to(event_mark);
                warn!(operation = op, error = %e, "unit of work rolled back");
                Err(e)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COLLATERAL OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit `amount` of `asset` into `user`'s position.
    ///
    /// Returns the new position total. The asset is pulled from `user`'s
    /// wallet into engine custody; a failed pull fails the whole call.
    pub fn deposit_collateral(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        self.unit_of_work("deposit_collateral", |engine| {
            engine.deposit_collateral_inner(user, asset, amount)
        })
    }

    fn deposit_collateral_inner(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }
        self.registry.require_supported(&asset)?;

        let new_total = self.ledger.add_collateral(&user, &asset, amount)?;
        self.events.push(EngineEvent::CollateralDeposited {
            user,
            asset,
            amount,
            timestamp: self.clock.unix_now(),
        });

        if !self.custody.pull(&user, &asset, amount) {
            return Err(Error::TransferFailed(format!(
                "collateral pull of {} {} from {}",
                amount, asset, user
            )));
        }

        debug!(%user, %asset, %amount, "collateral deposited");
        Ok(new_total)
    }

    /// Redeem `amount` of `asset` from `user`'s position back to their
    /// wallet.
    ///
    /// Returns the remaining position. The redemption is re-validated
    /// against `user`'s health factor before any collateral leaves custody.
    pub fn redeem_collateral(
        &mut self,
        user: AccountId,
        asset: AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        self.unit_of_work("redeem_collateral", |engine| {
            let remaining = engine.redeem_collateral_inner(user, user, asset, amount)?;
            Ok(remaining)
        })
    }

    /// Shared redemption primitive: decrement `from`'s position, check
    /// `from`'s health, then release custody to `to`.
    fn redeem_collateral_inner(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        let remaining = self.ledger.sub_collateral(&from, &asset, amount)?;
        self.events.push(EngineEvent::CollateralRedeemed {
            from,
            to,
            asset,
            amount,
            timestamp: self.clock.unix_now(),
        });

        let factor = self.health_factor(&from)?;
        health::assert_healthy(factor, self.params.min_health_factor)?;

        if !self.custody.release(&to, &asset, amount) {
            return Err(Error::TransferFailed(format!(
                "collateral release of {} {} to {}",
                amount, asset, to
            )));
        }

        debug!(%from, %to, %asset, %amount, "collateral redeemed");
        Ok(remaining)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEBT OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint `amount` of debt claims against `user`'s collateral.
    ///
    /// The debt increment is speculative: if the resulting health factor is
    /// below the minimum, the call fails with `HealthFactorBroken` and no
    /// state persists. Returns the post-mint health factor.
    pub fn mint_debt(&mut self, user: AccountId, amount: DebtAmount) -> Result<u128> {
        self.unit_of_work("mint_debt", |engine| engine.mint_debt_inner(user, amount))
    }

    fn mint_debt_inner(&mut self, user: AccountId, amount: DebtAmount) -> Result<u128> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        self.ledger.add_debt(&user, amount)?;
        let factor = self.health_factor(&user)?;
        health::assert_healthy(factor, self.params.min_health_factor)?;

        if !self.debt_token.mint(&user, amount) {
            return Err(Error::MintFailed);
        }

        self.events.push(EngineEvent::DebtMinted {
            user,
            amount,
            health_factor: factor,
            timestamp: self.clock.unix_now(),
        });

        info!(%user, %amount, factor, "debt minted");
        Ok(factor)
    }

    /// Retire `amount` of debt claims attributed to `on_behalf_of`, paid
    /// from `payer`'s claim balance.
    ///
    /// Returns the remaining attributed debt. Burning can only improve
    /// health, so no health check runs.
    pub fn burn_debt(
        &mut self,
        payer: AccountId,
        on_behalf_of: AccountId,
        amount: DebtAmount,
    ) -> Result<DebtAmount> {
        self.unit_of_work("burn_debt", |engine| {
            engine.burn_debt_inner(payer, on_behalf_of, amount)
        })
    }

    fn burn_debt_inner(
        &mut self,
        payer: AccountId,
        on_behalf_of: AccountId,
        amount: DebtAmount,
    ) -> Result<DebtAmount> {
        if amount.is_zero() {
            return Err(Error::InvalidAmount);
        }

        let remaining = self.ledger.sub_debt(&on_behalf_of, amount)?;
        self.retire_claims(&payer, amount)?;

        self.events.push(EngineEvent::DebtBurned {
            payer,
            on_behalf_of,
            amount,
            timestamp: self.clock.unix_now(),
        });

        debug!(%payer, %on_behalf_of, %amount, "debt burned");
        Ok(remaining)
    }

    /// Pull `amount` claims from `payer` into custody and destroy them.
    ///
    /// A failed destroy compensates the pull before surfacing the error.
    pub(crate) fn retire_claims(&mut self, payer: &AccountId, amount: DebtAmount) -> Result<()> {
        if !self.debt_token.pull(payer, amount) {
            return Err(Error::TransferFailed(format!(
                "debt claim pull of {} from {}",
                amount, payer
            )));
        }
        if !self.debt_token.burn(amount) {
            if !self.debt_token.release(payer, amount) {
                error!(%payer, %amount, "compensating claim release failed; external supply may be inconsistent");
            }
            return Err(Error::TransferFailed(format!(
                "debt claim burn of {}",
                amount
            )));
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COMPOSITE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit collateral and mint debt in one atomic unit of work.
    ///
    /// If the mint fails, the deposit's effects are undone as well,
    /// including a compensating release of the pulled collateral.
    pub fn deposit_and_mint(
        &mut self,
        user: AccountId,
        asset: AssetId,
        collateral_amount: CollateralAmount,
        debt_amount: DebtAmount,
    ) -> Result<u128> {
        self.unit_of_work("deposit_and_mint", |engine| {
            engine.deposit_collateral_inner(user, asset, collateral_amount)?;
            match engine.mint_debt_inner(user, debt_amount) {
                Ok(factor) => Ok(factor),
                Err(e) => {
                    if !engine.custody.release(&user, &asset, collateral_amount) {
                        error!(%user, %asset, "compensating collateral release failed; custody may be inconsistent");
                    }
                    Err(e)
                }
            }
        })
    }

    /// Burn debt and redeem collateral in one atomic unit of work.
    ///
    /// Both ledger effects apply before the health check so the check sees
    /// the post-burn debt, then externals run value-inward first.
    pub fn redeem_and_burn(
        &mut self,
        user: AccountId,
        asset: AssetId,
        collateral_amount: CollateralAmount,
        debt_amount: DebtAmount,
    ) -> Result<u128> {
        self.unit_of_work("redeem_and_burn", |engine| {
            if collateral_amount.is_zero() || debt_amount.is_zero() {
                return Err(Error::InvalidAmount);
            }

            engine.ledger.sub_debt(&user, debt_amount)?;
            engine.ledger.sub_collateral(&user, &asset, collateral_amount)?;

            let factor = engine.health_factor(&user)?;
            health::assert_healthy(factor, engine.params.min_health_factor)?;

            let timestamp = engine.clock.unix_now();
            engine.events.push(EngineEvent::DebtBurned {
                payer: user,
                on_behalf_of: user,
                amount: debt_amount,
                timestamp,
            });
            engine.events.push(EngineEvent::CollateralRedeemed {
                from: user,
                to: user,
                asset,
                amount: collateral_amount,
                timestamp,
            });

            engine.retire_claims(&user, debt_amount)?;

            if !engine.custody.release(&user, &asset, collateral_amount) {
                error!(%user, %asset, "collateral release failed after claim burn; external supply may be inconsistent");
                return Err(Error::TransferFailed(format!(
                    "collateral release of {} {} to {}",
                    collateral_amount, asset, user
                )));
            }

            debug!(%user, %asset, %collateral_amount, %debt_amount, "redeemed and burned");
            Ok(factor)
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALUATION & HEALTH QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    fn oracle(&self, asset: &AssetId) -> Result<&dyn PriceSource> {
        self.oracles
            .get(asset)
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| Error::UnsupportedAsset(asset.to_hex()))
    }

    /// USD value of `amount` of `asset` at the latest validated price
    pub fn usd_value(&self, asset: &AssetId, amount: CollateralAmount) -> Result<UsdValue> {
        valuation::usd_value(
            self.oracle(asset)?,
            self.clock.unix_now(),
            self.params.max_price_age_secs,
            amount,
        )
    }

    /// Quantity of `asset` worth `usd` at the latest validated price
    pub fn token_amount_from_usd(
        &self,
        asset: &AssetId,
        usd: UsdValue,
    ) -> Result<CollateralAmount> {
        valuation::token_amount_from_usd(
            self.oracle(asset)?,
            self.clock.unix_now(),
            self.params.max_price_age_secs,
            usd,
        )
    }

    /// Total USD value of `user`'s collateral across every supported asset
    pub fn total_collateral_usd_value(&self, user: &AccountId) -> Result<UsdValue> {
        let mut total = UsdValue::ZERO;
        for asset in self.registry.assets() {
            let amount = self.ledger.collateral_of(user, asset);
            if amount.is_zero() {
                continue;
            }
            let value = self.usd_value(asset, amount)?;
            total = UsdValue::from_raw(checked_add(total.raw(), value.raw())?);
        }
        Ok(total)
    }

    /// Current health factor of `user` (18-decimal fixed point)
    pub fn health_factor(&self, user: &AccountId) -> Result<u128> {
        let debt = self.ledger.debt_of(user);
        if debt.is_zero() {
            // No valuation needed: a user with no debt is maximally healthy
            return health::health_factor(
                UsdValue::ZERO,
                debt,
                self.params.liquidation_threshold_pct,
            );
        }
        let collateral_usd = self.total_collateral_usd_value(user)?;
        health::health_factor(collateral_usd, debt, self.params.liquidation_threshold_pct)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ-ONLY ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Collateral deposited by `user` in `asset`
    pub fn collateral_balance(&self, user: &AccountId, asset: &AssetId) -> CollateralAmount {
        self.ledger.collateral_of(user, asset)
    }

    /// Debt attributed to `user`
    pub fn debt_of(&self, user: &AccountId) -> DebtAmount {
        self.ledger.debt_of(user)
    }

    /// `user`'s outstanding debt and total collateral USD value
    pub fn account_information(&self, user: &AccountId) -> Result<(DebtAmount, UsdValue)> {
        Ok((
            self.ledger.debt_of(user),
            self.total_collateral_usd_value(user)?,
        ))
    }

    /// All supported collateral assets
    pub fn supported_assets(&self) -> &[AssetId] {
        self.registry.assets()
    }

    /// Configured parameters
    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// The position ledger (read-only)
    pub fn ledger(&self) -> &GlobalLedger {
        &self.ledger
    }

    /// Canonical fingerprint of the position state
    pub fn state_hash(&self) -> StateHash {
        self.ledger.state_hash()
    }

    /// Operation records emitted so far
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Aggregate liquidation statistics
    pub fn liquidation_stats(&self) -> &LiquidationStats {
        &self.liquidation_stats
    }

    /// The debt-token collaborator
    pub fn debt_token(&self) -> &T {
        &self.debt_token
    }

    /// Mutable access to the debt-token collaborator (test harnesses)
    pub fn debt_token_mut(&mut self) -> &mut T {
        &mut self.debt_token
    }

    /// The collateral-custody collaborator
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Mutable access to the custody collaborator (test harnesses)
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    /// Handle over the engine's reentrancy guard, for probes
    pub fn reentrancy_guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CHECKPOINTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Checkpoint the position ledger into `store`
    pub fn checkpoint<B: StorageBackend>(&self, store: &B) -> Result<()> {
        storage::save_ledger(store, &self.ledger)
    }

    /// Replace the position ledger with the checkpoint in `store`, if any.
    ///
    /// Returns whether a checkpoint was found.
    pub fn restore_checkpoint<B: StorageBackend>(&mut self, store: &B) -> Result<bool> {
        match storage::load_ledger(store)? {
            Some(ledger) => {
                self.ledger = ledger;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::custody::InMemoryCollateralVault;
    use crate::external::oracle::{PriceHandle, StaticPriceSource};
    use crate::external::token::InMemoryDebtToken;
    use crate::utils::constants::*;
    use crate::utils::time::ManualClock;

    pub(crate) const T0: u64 = 1_700_000_000;

    pub(crate) fn alice() -> AccountId {
        AccountId::new([0x01; ACCOUNT_ID_LENGTH])
    }

    pub(crate) fn bob() -> AccountId {
        AccountId::new([0x02; ACCOUNT_ID_LENGTH])
    }

    pub(crate) fn weth() -> AssetId {
        AssetId::new([0xAA; ASSET_ID_LENGTH])
    }

    pub(crate) struct Harness {
        pub engine: Engine<InMemoryDebtToken, InMemoryCollateralVault>,
        pub price: PriceHandle,
        pub clock: ManualClock,
    }

    /// Engine with one supported asset priced at $2,000 and a funded wallet
    /// for alice and bob.
    pub(crate) fn harness() -> Harness {
        let feed = StaticPriceSource::new(2_000_00000000, T0);
        let price = feed.handle();
        let clock = ManualClock::at(T0);

        let mut vault = InMemoryCollateralVault::new();
        vault.credit(&alice(), &weth(), CollateralAmount::from_whole(100));
        vault.credit(&bob(), &weth(), CollateralAmount::from_whole(100));

        let engine = Engine::new(
            EngineParams::default(),
            vec![weth()],
            vec![Box::new(feed)],
            InMemoryDebtToken::new(),
            vault,
            Box::new(clock.clone()),
        )
        .unwrap();

        Harness {
            engine,
            price,
            clock,
        }
    }

    #[test]
    fn test_constructor_rejects_mismatched_lists() {
        let feed = StaticPriceSource::new(2_000_00000000, T0);
        let result = Engine::new(
            EngineParams::default(),
            vec![weth()],
            vec![Box::new(feed.clone()) as Box<dyn PriceSource>, Box::new(feed)],
            InMemoryDebtToken::new(),
            InMemoryCollateralVault::new(),
            Box::new(ManualClock::at(T0)),
        );
        assert!(matches!(result.err().unwrap(), Error::ConfigMismatch { .. }));
    }

    #[test]
    fn test_deposit_updates_position_and_custody() {
        let mut h = harness();

        let total = h
            .engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();
        assert_eq!(total, CollateralAmount::from_whole(10));
        assert_eq!(
            h.engine.collateral_balance(&alice(), &weth()),
            CollateralAmount::from_whole(10)
        );
        assert_eq!(
            h.engine.custody().custody_balance(&weth()),
            CollateralAmount::from_whole(10)
        );
        assert_eq!(
            h.engine.custody().balance_of(&alice(), &weth()),
            CollateralAmount::from_whole(90)
        );
        assert_eq!(h.engine.events().len(), 1);
    }

    #[test]
    fn test_deposit_rejects_zero_and_unsupported() {
        let mut h = harness();

        assert_eq!(
            h.engine
                .deposit_collateral(alice(), weth(), CollateralAmount::ZERO)
                .unwrap_err(),
            Error::InvalidAmount
        );

        let unknown = AssetId::new([0xCC; ASSET_ID_LENGTH]);
        assert!(matches!(
            h.engine
                .deposit_collateral(alice(), unknown, CollateralAmount::from_whole(1))
                .unwrap_err(),
            Error::UnsupportedAsset(_)
        ));
    }

    #[test]
    fn test_deposit_transfer_failure_rolls_back() {
        let mut h = harness();
        let before = h.engine.state_hash();

        h.engine.custody_mut().set_fail_pull(true);
        let err = h
            .engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap_err();
        assert!(matches!(err, Error::TransferFailed(_)));

        assert_eq!(h.engine.state_hash(), before);
        assert!(h.engine.events().is_empty());
    }

    #[test]
    fn test_mint_requires_health() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();

        // $20,000 collateral at 50% threshold backs exactly 10,000 debt
        let factor = h
            .engine
            .mint_debt(alice(), DebtAmount::from_whole(2_000))
            .unwrap();
        assert_eq!(factor, 5 * FIXED_POINT_SCALE);
        assert_eq!(
            h.engine.debt_token().balance_of(&alice()),
            DebtAmount::from_whole(2_000)
        );
    }

    #[test]
    fn test_mint_failure_reverts_speculative_debt() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();

        h.engine.debt_token_mut().set_fail_mint(true);
        let err = h
            .engine
            .mint_debt(alice(), DebtAmount::from_whole(100))
            .unwrap_err();
        assert_eq!(err, Error::MintFailed);
        assert!(h.engine.debt_of(&alice()).is_zero());
    }

    #[test]
    fn test_redeem_gated_by_health() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();
        h.engine
            .mint_debt(alice(), DebtAmount::from_whole(10_000))
            .unwrap();

        // Any redemption now drops the factor below 1.0
        let err = h
            .engine
            .redeem_collateral(alice(), weth(), CollateralAmount::from_whole(1))
            .unwrap_err();
        assert!(matches!(err, Error::HealthFactorBroken { .. }));
        assert_eq!(
            h.engine.collateral_balance(&alice(), &weth()),
            CollateralAmount::from_whole(10)
        );
    }

    #[test]
    fn test_deposit_then_redeem_is_noop() {
        let mut h = harness();
        let ledger_before = h.engine.state_hash();
        let wallet_before = h.engine.custody().balance_of(&alice(), &weth());

        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();
        h.engine
            .redeem_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();

        assert_eq!(h.engine.state_hash(), ledger_before);
        assert_eq!(h.engine.custody().balance_of(&alice(), &weth()), wallet_before);
    }

    #[test]
    fn test_burn_debt_retires_claims() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();
        h.engine
            .mint_debt(alice(), DebtAmount::from_whole(2_000))
            .unwrap();

        let remaining = h
            .engine
            .burn_debt(alice(), alice(), DebtAmount::from_whole(500))
            .unwrap();
        assert_eq!(remaining, DebtAmount::from_whole(1_500));
        assert_eq!(
            h.engine.debt_token().total_supply(),
            DebtAmount::from_whole(1_500)
        );
    }

    #[test]
    fn test_burn_failure_compensates_pull() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();
        h.engine
            .mint_debt(alice(), DebtAmount::from_whole(2_000))
            .unwrap();

        h.engine.debt_token_mut().set_fail_burn(true);
        let err = h
            .engine
            .burn_debt(alice(), alice(), DebtAmount::from_whole(500))
            .unwrap_err();
        assert!(matches!(err, Error::TransferFailed(_)));

        // Debt attribution untouched and the pulled claims returned
        assert_eq!(h.engine.debt_of(&alice()), DebtAmount::from_whole(2_000));
        assert_eq!(
            h.engine.debt_token().balance_of(&alice()),
            DebtAmount::from_whole(2_000)
        );
        assert!(h.engine.debt_token().custody_balance().is_zero());
    }

    #[test]
    fn test_composite_deposit_and_mint_atomic() {
        let mut h = harness();
        let before = h.engine.state_hash();
        let wallet_before = h.engine.custody().balance_of(&alice(), &weth());

        // Minting far beyond the threshold fails the whole composite
        let err = h
            .engine
            .deposit_and_mint(
                alice(),
                weth(),
                CollateralAmount::from_whole(10),
                DebtAmount::from_whole(50_000),
            )
            .unwrap_err();
        assert!(matches!(err, Error::HealthFactorBroken { .. }));

        assert_eq!(h.engine.state_hash(), before);
        assert_eq!(h.engine.custody().balance_of(&alice(), &weth()), wallet_before);
        assert!(h.engine.debt_token().total_supply().is_zero());
    }

    #[test]
    fn test_composite_redeem_and_burn() {
        let mut h = harness();
        h.engine
            .deposit_and_mint(
                alice(),
                weth(),
                CollateralAmount::from_whole(10),
                DebtAmount::from_whole(10_000),
            )
            .unwrap();

        // At maximum debt a lone redemption is rejected, but redeeming
        // while burning proportionally passes the post-burn health check
        h.engine
            .redeem_and_burn(
                alice(),
                weth(),
                CollateralAmount::from_whole(5),
                DebtAmount::from_whole(5_000),
            )
            .unwrap();

        assert_eq!(h.engine.debt_of(&alice()), DebtAmount::from_whole(5_000));
        assert_eq!(
            h.engine.collateral_balance(&alice(), &weth()),
            CollateralAmount::from_whole(5)
        );
    }

    #[test]
    fn test_stale_price_blocks_mint() {
        let mut h = harness();
        h.engine
            .deposit_collateral(alice(), weth(), CollateralAmount::from_whole(10))
            .unwrap();

        h.clock.advance(MAX_PRICE_AGE_SECS + 1);
        let err = h
            .engine
            .mint_debt(alice(), DebtAmount::from_whole(100))
            .unwrap_err();
        assert!(matches!(err, Error::StalePrice { .. }));

        // A fresh round unblocks the same mint
        h.price.set_price(2_000_00000000, h.clock.unix_now());
        assert!(h.engine.mint_debt(alice(), DebtAmount::from_whole(100)).is_ok());
    }

    #[test]
    fn test_checkpoint_round_trip() {
        use crate::storage::InMemoryStore;

        let mut h = harness();
        h.engine
            .deposit_and_mint(
                alice(),
                weth(),
                CollateralAmount::from_whole(10),
                DebtAmount::from_whole(2_000),
            )
            .unwrap();
        let hash = h.engine.state_hash();

        let store = InMemoryStore::new();
        h.engine.checkpoint(&store).unwrap();

        let mut fresh = harness();
        assert!(fresh.engine.restore_checkpoint(&store).unwrap());
        assert_eq!(fresh.engine.state_hash(), hash);

        let empty_store = InMemoryStore::new();
        assert!(!fresh.engine.restore_checkpoint(&empty_store).unwrap());
    }
}
