//! Engine constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED-POINT CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-point scale for all monetary and factor quantities (18 decimals)
pub const FIXED_POINT_SCALE: u128 = 1_000_000_000_000_000_000;

/// Number of decimals in the fixed-point representation
pub const FIXED_POINT_DECIMALS: u32 = 18;

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Native precision of oracle prices (8 decimal digits)
pub const PRICE_FEED_DECIMALS: u32 = 8;

/// Native oracle price scale (10^8)
pub const PRICE_FEED_PRECISION: u128 = 100_000_000;

/// Multiplier that lifts a native 8-decimal price to the 18-decimal scale
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;

/// Maximum tolerated price staleness in seconds (1 hour)
pub const MAX_PRICE_AGE_SECS: u64 = 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// SOLVENCY CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Share of raw collateral value counted toward backing debt (50%),
/// equivalent to a 200% overcollateralization requirement
pub const LIQUIDATION_THRESHOLD_PCT: u128 = 50;

/// Incentive paid to a liquidator in seized collateral (10%)
pub const LIQUIDATION_BONUS_PCT: u128 = 10;

/// Divisor for percentage quantities
pub const PCT_DIVISOR: u128 = 100;

/// Minimum health factor for a solvent position (1.0 at 18 decimals)
pub const MIN_HEALTH_FACTOR: u128 = FIXED_POINT_SCALE;

/// Health factor reported for a position with no debt
pub const MAX_HEALTH_FACTOR: u128 = u128::MAX;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of an account identifier in bytes
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Length of an asset identifier in bytes
pub const ASSET_ID_LENGTH: usize = 20;

/// Length of a ledger state hash in bytes (SHA256)
pub const HASH_LENGTH: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of records retained in the in-memory event log
pub const MAX_EVENT_LOG_LEN: usize = 10_000;
