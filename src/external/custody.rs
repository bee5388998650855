//! Collateral asset custody interface.
//!
//! Collateral assets live on external asset ledgers. The engine moves them
//! through a narrow custody capability: pull an amount from a depositor's
//! wallet into engine custody, or release custody back out to a recipient.
//! A `false` return is treated as a hard failure of the whole unit of work.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ledger::{AccountId, AssetId, CollateralAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// CUSTODY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability interface to the external collateral-asset ledgers
pub trait CollateralCustody: Send + Sync {
    /// Pull `amount` of `asset` from `from`'s wallet into engine custody
    fn pull(&mut self, from: &AccountId, asset: &AssetId, amount: CollateralAmount) -> bool;

    /// Release `amount` of `asset` from engine custody to `to`'s wallet
    fn release(&mut self, to: &AccountId, asset: &AssetId, amount: CollateralAmount) -> bool;

    /// Wallet balance of `holder` in `asset`
    fn balance_of(&self, holder: &AccountId, asset: &AssetId) -> CollateralAmount;

    /// Amount of `asset` currently held in engine custody
    fn custody_balance(&self, asset: &AssetId) -> CollateralAmount;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY VAULT
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory collateral custody for tests and harnesses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCollateralVault {
    wallets: HashMap<(AccountId, AssetId), CollateralAmount>,
    custody: HashMap<AssetId, CollateralAmount>,
    fail_pull: bool,
    fail_release: bool,
}

impl InMemoryCollateralVault {
    /// Create an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund a wallet (test fixture helper)
    pub fn credit(&mut self, holder: &AccountId, asset: &AssetId, amount: CollateralAmount) {
        let balance = self
            .wallets
            .entry((*holder, *asset))
            .or_insert(CollateralAmount::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Make subsequent `pull` calls report failure
    pub fn set_fail_pull(&mut self, fail: bool) {
        self.fail_pull = fail;
    }

    /// Make subsequent `release` calls report failure
    pub fn set_fail_release(&mut self, fail: bool) {
        self.fail_release = fail;
    }
}

impl CollateralCustody for InMemoryCollateralVault {
    fn pull(&mut self, from: &AccountId, asset: &AssetId, amount: CollateralAmount) -> bool {
        if self.fail_pull {
            return false;
        }
        let balance = self
            .wallets
            .entry((*from, *asset))
            .or_insert(CollateralAmount::ZERO);
        let Some(remaining) = balance.checked_sub(amount) else {
            return false;
        };
        *balance = remaining;

        let held = self.custody.entry(*asset).or_insert(CollateralAmount::ZERO);
        *held = held.saturating_add(amount);
        true
    }

    fn release(&mut self, to: &AccountId, asset: &AssetId, amount: CollateralAmount) -> bool {
        if self.fail_release {
            return false;
        }
        let held = self.custody.entry(*asset).or_insert(CollateralAmount::ZERO);
        let Some(remaining) = held.checked_sub(amount) else {
            return false;
        };
        *held = remaining;

        let balance = self
            .wallets
            .entry((*to, *asset))
            .or_insert(CollateralAmount::ZERO);
        *balance = balance.saturating_add(amount);
        true
    }

    fn balance_of(&self, holder: &AccountId, asset: &AssetId) -> CollateralAmount {
        self.wallets
            .get(&(*holder, *asset))
            .copied()
            .unwrap_or(CollateralAmount::ZERO)
    }

    fn custody_balance(&self, asset: &AssetId) -> CollateralAmount {
        self.custody
            .get(asset)
            .copied()
            .unwrap_or(CollateralAmount::ZERO)
    }
}
