//! Price normalization and USD conversion.
//!
//! Oracle prices arrive at an 8-decimal native precision and are lifted to
//! the ledger's 18-decimal scale by a fixed multiplicative factor. All
//! conversions run through 256-bit intermediates and truncate toward zero.

use crate::core::ledger::{CollateralAmount, UsdValue};
use crate::error::{Error, Result};
use crate::external::oracle::PriceSource;
use crate::utils::constants::*;
use crate::utils::math::{checked_mul, mul_div};

/// Fetch, validate, and normalize the latest price from `source`.
///
/// Returns the price at the 18-decimal scale. Rejects zero and future-dated
/// rounds with [`Error::InvalidPrice`] and rounds older than
/// `max_age_secs` with [`Error::StalePrice`].
pub fn validated_price(source: &dyn PriceSource, now: u64, max_age_secs: u64) -> Result<u128> {
    let round = source.latest_round()?;

    if round.price == 0 {
        return Err(Error::InvalidPrice {
            reason: format!("zero price in round {}", round.round_id),
        });
    }
    if round.updated_at > now {
        return Err(Error::InvalidPrice {
            reason: format!(
                "round {} dated {}s into the future",
                round.round_id,
                round.updated_at - now
            ),
        });
    }

    let age = round.age(now);
    if age > max_age_secs {
        return Err(Error::StalePrice {
            age_secs: age,
            max_age_secs,
        });
    }

    checked_mul(round.price as u128, ADDITIONAL_FEED_PRECISION)
}

/// USD value of `amount` of the asset priced by `source`.
///
/// A zero amount short-circuits to zero without querying the gateway, so a
/// failing gateway is not surfaced for zero-amount queries.
pub fn usd_value(
    source: &dyn PriceSource,
    now: u64,
    max_age_secs: u64,
    amount: CollateralAmount,
) -> Result<UsdValue> {
    if amount.is_zero() {
        return Ok(UsdValue::ZERO);
    }

    let price = validated_price(source, now, max_age_secs)?;
    let raw = mul_div(price, amount.raw(), FIXED_POINT_SCALE)?;
    Ok(UsdValue::from_raw(raw))
}

/// Quantity of the asset priced by `source` worth `usd`.
///
/// Algebraic inverse of [`usd_value`] up to integer-division truncation;
/// round trips may lose one raw unit. Zero short-circuits like
/// [`usd_value`].
pub fn token_amount_from_usd(
    source: &dyn PriceSource,
    now: u64,
    max_age_secs: u64,
    usd: UsdValue,
) -> Result<CollateralAmount> {
    if usd.is_zero() {
        return Ok(CollateralAmount::ZERO);
    }

    let price = validated_price(source, now, max_age_secs)?;
    let raw = mul_div(usd.raw(), FIXED_POINT_SCALE, price)?;
    Ok(CollateralAmount::from_raw(raw))
}
