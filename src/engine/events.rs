//! Engine operation records.
//!
//! Every successful state change appends a record to the in-memory event
//! log. Records emitted inside a unit of work that later fails are rolled
//! back together with the ledger state.

use serde::{Deserialize, Serialize};

use crate::core::ledger::{AccountId, AssetId, CollateralAmount, DebtAmount};
use crate::error::{Error, Result};
use crate::utils::constants::MAX_EVENT_LOG_LEN;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Record of a completed engine operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Collateral entered a position
    CollateralDeposited {
        /// Depositing user
        user: AccountId,
        /// Deposited asset
        asset: AssetId,
        /// Deposited amount
        amount: CollateralAmount,
        /// Unix timestamp
        timestamp: u64,
    },
    /// Collateral left a position
    CollateralRedeemed {
        /// Position the collateral left
        from: AccountId,
        /// Recipient of the released collateral
        to: AccountId,
        /// Redeemed asset
        asset: AssetId,
        /// Redeemed amount
        amount: CollateralAmount,
        /// Unix timestamp
        timestamp: u64,
    },
    /// Debt claims were issued against a position
    DebtMinted {
        /// Position the debt is attributed to
        user: AccountId,
        /// Minted amount
        amount: DebtAmount,
        /// Health factor after the mint (18-decimal fixed point)
        health_factor: u128,
        /// Unix timestamp
        timestamp: u64,
    },
    /// Debt claims were retired
    DebtBurned {
        /// Account that paid the claims
        payer: AccountId,
        /// Position the retirement is attributed to
        on_behalf_of: AccountId,
        /// Retired amount
        amount: DebtAmount,
        /// Unix timestamp
        timestamp: u64,
    },
    /// An under-collateralized position was liquidated
    PositionLiquidated {
        /// Caller who performed the liquidation
        liquidator: AccountId,
        /// Position that was liquidated
        target: AccountId,
        /// Asset seized
        asset: AssetId,
        /// Debt retired from the target
        debt_covered: DebtAmount,
        /// Collateral seized, bonus included
        collateral_seized: CollateralAmount,
        /// Bonus portion of the seizure
        bonus: CollateralAmount,
        /// Target health factor before the call
        health_factor_before: u128,
        /// Target health factor after the call
        health_factor_after: u128,
        /// Unix timestamp
        timestamp: u64,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Bounded in-memory record log with rollback support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<EngineEvent>,
    #[serde(default = "default_max_events")]
    max_events: usize,
}

fn default_max_events() -> usize {
    MAX_EVENT_LOG_LEN
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create an empty log with the default retention bound
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            max_events: MAX_EVENT_LOG_LEN,
        }
    }

    /// Append a record, pruning the oldest entries past the bound
    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
        if self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(0..excess);
        }
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Current position, for rollback marks
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    /// Discard every record appended after `mark`
    pub fn rollback_to(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// All retained records, oldest first
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Export the retained records as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.events).map_err(|e| Error::Serialization(e.to_string()))
    }
}
