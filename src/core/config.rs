//! Engine parameters and the supported-asset registry.
//!
//! Parameters are fixed at construction; the registry binds each supported
//! asset to exactly one price-oracle source and is immutable for the
//! engine's lifetime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ledger::AssetId;
use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Solvency and oracle parameters, set once at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Share of raw collateral value counted toward backing debt (percent)
    pub liquidation_threshold_pct: u128,

    /// Incentive paid to a liquidator in seized collateral (percent)
    pub liquidation_bonus_pct: u128,

    /// Minimum health factor for a solvent position (18-decimal fixed point)
    pub min_health_factor: u128,

    /// Maximum tolerated oracle price age in seconds
    pub max_price_age_secs: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            liquidation_threshold_pct: LIQUIDATION_THRESHOLD_PCT,
            liquidation_bonus_pct: LIQUIDATION_BONUS_PCT,
            min_health_factor: MIN_HEALTH_FACTOR,
            max_price_age_secs: MAX_PRICE_AGE_SECS,
        }
    }
}

impl EngineParams {
    /// Override the liquidation threshold (for testing)
    pub fn with_threshold_pct(mut self, pct: u128) -> Self {
        self.liquidation_threshold_pct = pct;
        self
    }

    /// Override the liquidation bonus (for testing)
    pub fn with_bonus_pct(mut self, pct: u128) -> Self {
        self.liquidation_bonus_pct = pct;
        self
    }

    /// Override the staleness bound (for testing)
    pub fn with_max_price_age(mut self, secs: u64) -> Self {
        self.max_price_age_secs = secs;
        self
    }

    /// Validate that the parameters are internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.liquidation_threshold_pct == 0 || self.liquidation_threshold_pct > PCT_DIVISOR {
            return Err(Error::InvalidParameter {
                name: "liquidation_threshold_pct".into(),
                reason: format!(
                    "must be in 1..={}, got {}",
                    PCT_DIVISOR, self.liquidation_threshold_pct
                ),
            });
        }
        if self.liquidation_bonus_pct >= PCT_DIVISOR {
            return Err(Error::InvalidParameter {
                name: "liquidation_bonus_pct".into(),
                reason: format!("must be below {}", PCT_DIVISOR),
            });
        }
        if self.min_health_factor == 0 {
            return Err(Error::InvalidParameter {
                name: "min_health_factor".into(),
                reason: "must be positive".into(),
            });
        }
        if self.max_price_age_secs == 0 {
            return Err(Error::InvalidParameter {
                name: "max_price_age_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable set of supported collateral assets.
///
/// Built once from two equal-length parallel lists (asset, oracle binding);
/// every supported asset has exactly one oracle and duplicates are
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: Vec<AssetId>,
}

impl AssetRegistry {
    /// Build the registry and the per-asset oracle map from parallel lists.
    ///
    /// Fails with [`Error::ConfigMismatch`] when the lists differ in
    /// length and [`Error::InvalidParameter`] on a duplicate asset.
    pub fn from_parallel_lists<O>(
        assets: Vec<AssetId>,
        oracles: Vec<O>,
    ) -> Result<(Self, HashMap<AssetId, O>)> {
        if assets.len() != oracles.len() {
            return Err(Error::ConfigMismatch {
                assets: assets.len(),
                oracles: oracles.len(),
            });
        }

        let mut bindings = HashMap::with_capacity(assets.len());
        for (asset, oracle) in assets.iter().zip(oracles) {
            if bindings.insert(*asset, oracle).is_some() {
                return Err(Error::InvalidParameter {
                    name: "assets".into(),
                    reason: format!("duplicate asset {}", asset.to_hex()),
                });
            }
        }

        Ok((Self { assets }, bindings))
    }

    /// All supported assets, in registration order
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Whether `asset` is supported
    pub fn contains(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }

    /// Fail with [`Error::UnsupportedAsset`] unless `asset` is supported
    pub fn require_supported(&self, asset: &AssetId) -> Result<()> {
        if !self.contains(asset) {
            return Err(Error::UnsupportedAsset(asset.to_hex()));
        }
        Ok(())
    }

    /// Number of supported assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
