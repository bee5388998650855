//! # vaultUSD Engine
//!
//! A collateral-backed debt ledger: users deposit approved collateral
//! assets and are issued debt-token claims against them, subject to a 200%
//! overcollateralization rule enforced on every state change.
//!
//! ## Architecture
//!
//! - **Core**: engine parameters, asset registry, and the global position
//!   ledger
//! - **Engine**: guarded all-or-nothing entry points, valuation, health
//!   factors, and the liquidation protocol
//! - **External**: narrow capability interfaces to the price gateways, the
//!   debt-token ledger, and collateral custody
//! - **Storage**: ledger checkpointing behind a backend trait
//!
//! ## Design Principles
//!
//! - Fixed-point integer arithmetic only, with wide intermediates
//! - Checks, effects, then interactions, under a non-reentrant guard
//! - No partial commits: every operation succeeds whole or rolls back whole
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultusd::prelude::*;
//!
//! let mut engine = Engine::new(params, assets, oracles, token, custody, clock)?;
//! engine.deposit_collateral(user, asset, amount)?;
//! engine.mint_debt(user, debt)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod engine;
pub mod error;
pub mod external;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        config::{AssetRegistry, EngineParams},
        ledger::{
            AccountId, AssetId, CollateralAmount, DebtAmount, GlobalLedger, StateHash, UsdValue,
        },
    };
    pub use crate::engine::{
        events::{EngineEvent, EventLog},
        liquidation::{LiquidationOutcome, LiquidationStats},
        Engine,
    };
    pub use crate::error::{Error, Result};
    pub use crate::external::{
        custody::{CollateralCustody, InMemoryCollateralVault},
        oracle::{PriceHandle, PriceRound, PriceSource, StaticPriceSource},
        token::{DebtToken, InMemoryDebtToken},
    };
    pub use crate::storage::{InMemoryStore, StorageBackend};
    pub use crate::utils::{
        guard::ReentrancyGuard,
        time::{Clock, ManualClock, SystemClock},
    };
}

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "vaultUSD";
