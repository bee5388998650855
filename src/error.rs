//! Error types for the vaultUSD engine.
//!
//! Every error is terminal for the unit of work that raised it: the engine
//! never commits partial state, and callers observe the full pre-operation
//! state on failure.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vaultUSD engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Amount must be strictly positive
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Asset is not in the supported-asset set
    #[error("Unsupported collateral asset: {0}")]
    UnsupportedAsset(String),

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Initialization list lengths do not match
    #[error("Config mismatch: {assets} assets but {oracles} oracle bindings")]
    ConfigMismatch {
        /// Number of asset identifiers supplied
        assets: usize,
        /// Number of oracle bindings supplied
        oracles: usize,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Solvency Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A mutating operation would leave the position under the minimum
    /// health factor
    #[error("Health factor broken: {factor}")]
    HealthFactorBroken {
        /// Resulting health factor (18-decimal fixed point)
        factor: u128,
    },

    /// Liquidation attempted against a position that is still healthy
    #[error("Health factor ok: {factor}, position cannot be liquidated")]
    HealthFactorOk {
        /// Target's current health factor (18-decimal fixed point)
        factor: u128,
    },

    /// Liquidation did not strictly improve the target's position
    #[error("Health factor not improved: {before} -> {after}")]
    HealthFactorNotImproved {
        /// Health factor observed before liquidation
        before: u128,
        /// Health factor after the attempted seizure and debt retirement
        after: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // External Collaborator Errors
    // ═══════════════════════════════════════════════════════════════════

    /// External asset or debt-claim movement did not succeed
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Debt-token ledger reported a failed mint
    #[error("Debt token mint failed")]
    MintFailed,

    /// Oracle price is older than the configured staleness bound
    #[error("Price is stale: last update {age_secs}s ago, max allowed {max_age_secs}s")]
    StalePrice {
        /// Seconds since the reported round was updated
        age_secs: u64,
        /// Maximum tolerated age in seconds
        max_age_secs: u64,
    },

    /// Oracle reported an unusable price (zero, or future-dated round)
    #[error("Invalid price from oracle: {reason}")]
    InvalidPrice {
        /// What made the round unusable
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Reentrancy
    // ═══════════════════════════════════════════════════════════════════

    /// A nested call into a guarded entry point was detected
    #[error("Reentrancy rejected: engine is already executing a unit of work")]
    ReentrancyRejected,

    // ═══════════════════════════════════════════════════════════════════
    // Ledger Invariant Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A collateral decrement would drive a position negative
    #[error("Insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral {
        /// Amount the decrement asked for
        requested: u128,
        /// Amount actually held in the position
        available: u128,
    },

    /// A debt decrement would drive a position negative
    #[error("Insufficient debt: requested {requested}, outstanding {outstanding}")]
    InsufficientDebt {
        /// Amount the decrement asked for
        requested: u128,
        /// Debt actually attributed to the position
        outstanding: u128,
    },

    /// Overflow in fixed-point arithmetic
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Serialization & Storage Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns true if this error signals a broken internal invariant
    /// rather than a rejected request.
    ///
    /// Invariant-class errors indicate a caller bug or ledger corruption;
    /// request-class errors are expected under adversarial input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::InsufficientCollateral { .. }
                | Error::InsufficientDebt { .. }
                | Error::Overflow { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Validation errors: 1xxx
            Error::InvalidAmount => 1001,
            Error::UnsupportedAsset(_) => 1002,
            Error::InvalidParameter { .. } => 1003,

            // Configuration errors: 2xxx
            Error::ConfigMismatch { .. } => 2001,

            // Solvency errors: 3xxx
            Error::HealthFactorBroken { .. } => 3001,
            Error::HealthFactorOk { .. } => 3002,
            Error::HealthFactorNotImproved { .. } => 3003,

            // External collaborator errors: 4xxx
            Error::TransferFailed(_) => 4001,
            Error::MintFailed => 4002,
            Error::StalePrice { .. } => 4003,
            Error::InvalidPrice { .. } => 4004,

            // Reentrancy: 5xxx
            Error::ReentrancyRejected => 5001,

            // Ledger invariant errors: 6xxx
            Error::InsufficientCollateral { .. } => 6001,
            Error::InsufficientDebt { .. } => 6002,
            Error::Overflow { .. } => 6003,

            // Serialization & storage errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,
            Error::Storage(_) => 7003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::InvalidAmount.code(),
            Error::UnsupportedAsset("".into()).code(),
            Error::InvalidParameter { name: "".into(), reason: "".into() }.code(),
            Error::ConfigMismatch { assets: 0, oracles: 0 }.code(),
            Error::HealthFactorBroken { factor: 0 }.code(),
            Error::HealthFactorOk { factor: 0 }.code(),
            Error::HealthFactorNotImproved { before: 0, after: 0 }.code(),
            Error::TransferFailed("".into()).code(),
            Error::MintFailed.code(),
            Error::StalePrice { age_secs: 0, max_age_secs: 0 }.code(),
            Error::InvalidPrice { reason: "".into() }.code(),
            Error::ReentrancyRejected.code(),
            Error::InsufficientCollateral { requested: 0, available: 0 }.code(),
            Error::InsufficientDebt { requested: 0, outstanding: 0 }.code(),
            Error::Overflow { operation: "".into() }.code(),
            Error::Serialization("".into()).code(),
            Error::Deserialization("".into()).code(),
            Error::Storage("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientCollateral {
            requested: 1000,
            available: 500,
        };
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("500"));

        let err = Error::StalePrice { age_secs: 7200, max_age_secs: 3600 };
        assert!(err.to_string().contains("7200"));
    }

    #[test]
    fn test_is_invariant_violation() {
        assert!(Error::InsufficientCollateral { requested: 1, available: 0 }
            .is_invariant_violation());
        assert!(Error::Overflow { operation: "test".into() }.is_invariant_violation());
        assert!(!Error::InvalidAmount.is_invariant_violation());
        assert!(!Error::HealthFactorBroken { factor: 0 }.is_invariant_violation());
    }
}
