//! Price gateway interface.
//!
//! Each supported asset is bound to one [`PriceSource`] at initialization.
//! Sources report a native 8-decimal price plus round metadata; the engine
//! normalizes and staleness-checks every reading before use.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE ROUND
// ═══════════════════════════════════════════════════════════════════════════════

/// A single price reading with freshness metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRound {
    /// Price at the source's native precision (8 decimal digits)
    pub price: u64,
    /// Unix timestamp of the round's last update
    pub updated_at: u64,
    /// Monotonic round identifier
    pub round_id: u64,
}

impl PriceRound {
    /// Create a new round
    pub fn new(price: u64, updated_at: u64, round_id: u64) -> Self {
        Self {
            price,
            updated_at,
            round_id,
        }
    }

    /// Age of the round in seconds relative to `now`
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.updated_at)
    }

    /// Whether the round is within the staleness bound at `now`
    pub fn is_fresh(&self, now: u64, max_age_secs: u64) -> bool {
        self.age(now) <= max_age_secs
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability interface to one asset's price gateway
pub trait PriceSource: Send + Sync {
    /// Latest round reported by the gateway
    fn latest_round(&self) -> Result<PriceRound>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC PRICE SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory price source for tests, harnesses, and fixed-price deployments.
///
/// A [`PriceHandle`] shares the same state, so a harness can keep updating
/// the round after the source has been handed to the engine.
#[derive(Debug, Clone)]
pub struct StaticPriceSource {
    inner: Arc<RwLock<SourceState>>,
}

#[derive(Debug)]
struct SourceState {
    round: PriceRound,
    offline: bool,
}

impl StaticPriceSource {
    /// Create a source reporting `price` as of `updated_at`
    pub fn new(price: u64, updated_at: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SourceState {
                round: PriceRound::new(price, updated_at, 1),
                offline: false,
            })),
        }
    }

    /// Obtain a handle for updating this source after it is handed off
    pub fn handle(&self) -> PriceHandle {
        PriceHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PriceSource for StaticPriceSource {
    fn latest_round(&self) -> Result<PriceRound> {
        let state = self
            .inner
            .read()
            .map_err(|e| Error::InvalidPrice {
                reason: format!("price source lock poisoned: {}", e),
            })?;

        if state.offline {
            return Err(Error::InvalidPrice {
                reason: "price source offline".into(),
            });
        }

        Ok(state.round)
    }
}

/// Mutation handle over a [`StaticPriceSource`]
#[derive(Debug, Clone)]
pub struct PriceHandle {
    inner: Arc<RwLock<SourceState>>,
}

impl PriceHandle {
    /// Publish a new price, advancing the round
    pub fn set_price(&self, price: u64, updated_at: u64) {
        if let Ok(mut state) = self.inner.write() {
            state.round = PriceRound::new(price, updated_at, state.round.round_id + 1);
        }
    }

    /// Rewrite the round's update timestamp without changing the price
    pub fn set_updated_at(&self, updated_at: u64) {
        if let Ok(mut state) = self.inner.write() {
            state.round.updated_at = updated_at;
        }
    }

    /// Toggle simulated gateway unavailability
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.inner.write() {
            state.offline = offline;
        }
    }
}
