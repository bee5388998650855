//! Identifiers, amount newtypes, and the global position ledger.
//!
//! The [`GlobalLedger`] exclusively owns every collateral and debt position
//! in the system. No other component mutates position records directly; the
//! engine routes every change through the checked mutators here, which fail
//! fast on any decrement that would drive a balance negative.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque 20-byte account identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Full hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for logs
    pub fn short(&self) -> String {
        format!("{}..", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Opaque 20-byte collateral-asset identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssetId([u8; ASSET_ID_LENGTH]);

impl AssetId {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ASSET_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ASSET_ID_LENGTH] {
        &self.0
    }

    /// Full hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for logs
    pub fn short(&self) -> String {
        format!("{}..", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT NEWTYPES
// ═══════════════════════════════════════════════════════════════════════════════

fn fmt_fixed(raw: u128, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let whole = raw / FIXED_POINT_SCALE;
    let frac = raw % FIXED_POINT_SCALE;
    if frac == 0 {
        write!(f, "{}", whole)
    } else {
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

macro_rules! fixed_amount {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            Serialize, Deserialize,
        )]
        pub struct $name(u128);

        impl $name {
            /// Zero amount
            pub const ZERO: Self = Self(0);

            /// Create from a raw 18-decimal fixed-point value
            pub const fn from_raw(raw: u128) -> Self {
                Self(raw)
            }

            /// Create from whole units (scales up by 10^18)
            pub const fn from_whole(units: u128) -> Self {
                Self(units * FIXED_POINT_SCALE)
            }

            /// Get the raw 18-decimal fixed-point value
            pub const fn raw(&self) -> u128 {
                self.0
            }

            /// Check if zero
            pub const fn is_zero(&self) -> bool {
                self.0 == 0
            }

            /// Checked addition
            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            /// Checked subtraction
            pub fn checked_sub(self, other: Self) -> Option<Self> {
                self.0.checked_sub(other.0).map(Self)
            }

            /// Saturating addition
            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Saturating subtraction
            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                fmt_fixed(self.0, f)
            }
        }

        impl From<u128> for $name {
            fn from(raw: u128) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u128 {
            fn from(amount: $name) -> Self {
                amount.0
            }
        }
    };
}

fixed_amount! {
    /// Quantity of a collateral asset, 18-decimal fixed point
    CollateralAmount
}

fixed_amount! {
    /// Quantity of debt claims, 18-decimal fixed point
    DebtAmount
}

fixed_amount! {
    /// USD-denominated value, 18-decimal fixed point
    UsdValue
}

impl DebtAmount {
    /// View this debt quantity as its USD value.
    ///
    /// Debt claims are USD-denominated one-to-one, so the conversion is an
    /// identity on the raw value; the explicit method keeps the peg
    /// assumption visible at call sites.
    pub const fn as_usd(&self) -> UsdValue {
        UsdValue::from_raw(self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// SHA256 fingerprint of the ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHash([u8; HASH_LENGTH]);

impl StateHash {
    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for StateHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBAL LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Restorable snapshot of the full position state
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    collateral: HashMap<AccountId, HashMap<AssetId, CollateralAmount>>,
    debt: HashMap<AccountId, DebtAmount>,
}

/// Process-wide position state: every collateral and debt position.
///
/// Positions are created implicitly on first deposit and removed when they
/// reach zero, so two logically equal ledgers always hash identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalLedger {
    /// Deposited collateral per user, per asset
    collateral: HashMap<AccountId, HashMap<AssetId, CollateralAmount>>,
    /// Debt claims attributed per user
    debt: HashMap<AccountId, DebtAmount>,
}

impl GlobalLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Collateral deposited by `user` in `asset`
    pub fn collateral_of(&self, user: &AccountId, asset: &AssetId) -> CollateralAmount {
        self.collateral
            .get(user)
            .and_then(|positions| positions.get(asset))
            .copied()
            .unwrap_or(CollateralAmount::ZERO)
    }

    /// Debt attributed to `user`
    pub fn debt_of(&self, user: &AccountId) -> DebtAmount {
        self.debt.get(user).copied().unwrap_or(DebtAmount::ZERO)
    }

    /// Total collateral held in `asset` across all users
    pub fn total_collateral(&self, asset: &AssetId) -> CollateralAmount {
        self.collateral
            .values()
            .filter_map(|positions| positions.get(asset))
            .fold(CollateralAmount::ZERO, |acc, amount| {
                acc.saturating_add(*amount)
            })
    }

    /// Total debt attributed across all users
    pub fn total_debt(&self) -> DebtAmount {
        self.debt
            .values()
            .fold(DebtAmount::ZERO, |acc, amount| acc.saturating_add(*amount))
    }

    /// All accounts holding a nonzero debt position
    pub fn debtors(&self) -> Vec<AccountId> {
        self.debt.keys().copied().collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Increment a collateral position, returning the new total
    pub fn add_collateral(
        &mut self,
        user: &AccountId,
        asset: &AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        let position = self
            .collateral
            .entry(*user)
            .or_default()
            .entry(*asset)
            .or_insert(CollateralAmount::ZERO);

        *position = position.checked_add(amount).ok_or(Error::Overflow {
            operation: format!("collateral position for {}", user),
        })?;

        Ok(*position)
    }

    /// Decrement a collateral position, returning the new total.
    ///
    /// A decrement past zero is an invariant violation and fails fast.
    pub fn sub_collateral(
        &mut self,
        user: &AccountId,
        asset: &AssetId,
        amount: CollateralAmount,
    ) -> Result<CollateralAmount> {
        let available = self.collateral_of(user, asset);
        let remaining = available
            .checked_sub(amount)
            .ok_or(Error::InsufficientCollateral {
                requested: amount.raw(),
                available: available.raw(),
            })?;

        if remaining.is_zero() {
            if let Some(positions) = self.collateral.get_mut(user) {
                positions.remove(asset);
                if positions.is_empty() {
                    self.collateral.remove(user);
                }
            }
        } else if let Some(positions) = self.collateral.get_mut(user) {
            positions.insert(*asset, remaining);
        }

        Ok(remaining)
    }

    /// Increment a debt position, returning the new total
    pub fn add_debt(&mut self, user: &AccountId, amount: DebtAmount) -> Result<DebtAmount> {
        let position = self.debt.entry(*user).or_insert(DebtAmount::ZERO);

        *position = position.checked_add(amount).ok_or(Error::Overflow {
            operation: format!("debt position for {}", user),
        })?;

        Ok(*position)
    }

    /// Decrement a debt position, returning the new total.
    ///
    /// A decrement past zero is an invariant violation and fails fast.
    pub fn sub_debt(&mut self, user: &AccountId, amount: DebtAmount) -> Result<DebtAmount> {
        let outstanding = self.debt_of(user);
        let remaining = outstanding
            .checked_sub(amount)
            .ok_or(Error::InsufficientDebt {
                requested: amount.raw(),
                outstanding: outstanding.raw(),
            })?;

        if remaining.is_zero() {
            self.debt.remove(user);
        } else {
            self.debt.insert(*user, remaining);
        }

        Ok(remaining)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SNAPSHOT & FINGERPRINT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Capture a restorable snapshot of the full position state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            collateral: self.collateral.clone(),
            debt: self.debt.clone(),
        }
    }

    /// Restore a previously captured snapshot, discarding current state
    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        self.collateral = snapshot.collateral;
        self.debt = snapshot.debt;
    }

    /// Canonical SHA256 fingerprint of the position state.
    ///
    /// Entries are ordered before hashing so that logically equal ledgers
    /// produce identical fingerprints regardless of map iteration order.
    pub fn state_hash(&self) -> StateHash {
        let collateral: BTreeMap<&AccountId, BTreeMap<&AssetId, u128>> = self
            .collateral
            .iter()
            .map(|(user, positions)| {
                (
                    user,
                    positions
                        .iter()
                        .map(|(asset, amount)| (asset, amount.raw()))
                        .collect(),
                )
            })
            .collect();
        let debt: BTreeMap<&AccountId, u128> = self
            .debt
            .iter()
            .map(|(user, amount)| (user, amount.raw()))
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(bincode::serialize(&collateral).unwrap_or_default());
        hasher.update(bincode::serialize(&debt).unwrap_or_default());
        StateHash(hasher.finalize().into())
    }

    /// Serialize the ledger to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a ledger from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}
