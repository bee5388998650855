//! Debt-token ledger interface.
//!
//! The debt token is a fungible claim ledger owned by an external
//! collaborator. The engine is its only authorized minter and interacts
//! through exactly the primitives below: mint to a user, pull claims from a
//! payer into engine custody, release custody back (the compensation path),
//! and destroy claims held in custody.
//!
//! Every movement reports success as a boolean; a `false` return is treated
//! by the engine as a hard failure of the whole unit of work.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ledger::{AccountId, DebtAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT TOKEN TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability interface to the external debt-token ledger
pub trait DebtToken: Send + Sync {
    /// Mint `amount` claims to `to`. Authorization is restricted to the
    /// engine; a `false` return is a hard error.
    fn mint(&mut self, to: &AccountId, amount: DebtAmount) -> bool;

    /// Pull `amount` claims from `payer` into engine custody
    fn pull(&mut self, payer: &AccountId, amount: DebtAmount) -> bool;

    /// Release `amount` claims from engine custody back to `to`
    fn release(&mut self, to: &AccountId, amount: DebtAmount) -> bool;

    /// Destroy `amount` claims held in engine custody
    fn burn(&mut self, amount: DebtAmount) -> bool;

    /// Claims held by `account`
    fn balance_of(&self, account: &AccountId) -> DebtAmount;

    /// Total outstanding claims, custody included
    fn total_supply(&self) -> DebtAmount;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY DEBT TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory debt-token ledger for tests and harnesses.
///
/// Failure toggles make each primitive refuse its next callers, so rollback
/// paths can be exercised deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDebtToken {
    balances: HashMap<AccountId, DebtAmount>,
    custody: DebtAmount,
    supply: DebtAmount,
    fail_mint: bool,
    fail_pull: bool,
    fail_release: bool,
    fail_burn: bool,
}

impl InMemoryDebtToken {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims currently held in engine custody
    pub fn custody_balance(&self) -> DebtAmount {
        self.custody
    }

    /// Make subsequent `mint` calls report failure
    pub fn set_fail_mint(&mut self, fail: bool) {
        self.fail_mint = fail;
    }

    /// Make subsequent `pull` calls report failure
    pub fn set_fail_pull(&mut self, fail: bool) {
        self.fail_pull = fail;
    }

    /// Make subsequent `release` calls report failure
    pub fn set_fail_release(&mut self, fail: bool) {
        self.fail_release = fail;
    }

    /// Make subsequent `burn` calls report failure
    pub fn set_fail_burn(&mut self, fail: bool) {
        self.fail_burn = fail;
    }
}

impl DebtToken for InMemoryDebtToken {
    fn mint(&mut self, to: &AccountId, amount: DebtAmount) -> bool {
        if self.fail_mint {
            return false;
        }
        let Some(new_supply) = self.supply.checked_add(amount) else {
            return false;
        };
        let balance = self.balances.entry(*to).or_insert(DebtAmount::ZERO);
        let Some(new_balance) = balance.checked_add(amount) else {
            return false;
        };
        *balance = new_balance;
        self.supply = new_supply;
        true
    }

    fn pull(&mut self, payer: &AccountId, amount: DebtAmount) -> bool {
        if self.fail_pull {
            return false;
        }
        let balance = self.balances.entry(*payer).or_insert(DebtAmount::ZERO);
        let Some(remaining) = balance.checked_sub(amount) else {
            return false;
        };
        *balance = remaining;
        self.custody = self.custody.saturating_add(amount);
        true
    }

    fn release(&mut self, to: &AccountId, amount: DebtAmount) -> bool {
        if self.fail_release {
            return false;
        }
        let Some(remaining) = self.custody.checked_sub(amount) else {
            return false;
        };
        self.custody = remaining;
        let balance = self.balances.entry(*to).or_insert(DebtAmount::ZERO);
        *balance = balance.saturating_add(amount);
        true
    }

    fn burn(&mut self, amount: DebtAmount) -> bool {
        if self.fail_burn {
            return false;
        }
        let Some(remaining_custody) = self.custody.checked_sub(amount) else {
            return false;
        };
        let Some(remaining_supply) = self.supply.checked_sub(amount) else {
            return false;
        };
        self.custody = remaining_custody;
        self.supply = remaining_supply;
        true
    }

    fn balance_of(&self, account: &AccountId) -> DebtAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(DebtAmount::ZERO)
    }

    fn total_supply(&self) -> DebtAmount {
        self.supply
    }
}
