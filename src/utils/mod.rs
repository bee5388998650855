//! Shared utilities for the vaultUSD engine.
//!
//! - `constants`: protocol-wide constants
//! - `math`: fixed-point arithmetic with wide intermediates
//! - `guard`: non-reentrant execution guard
//! - `time`: clock capability for staleness checks

pub mod constants;
pub mod guard;
pub mod math;
pub mod time;
