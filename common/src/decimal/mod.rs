//! Decimal type utilities for exact exchange arithmetic

use rust_decimal::{Decimal, RoundingStrategy};
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

/// Amount of a single currency
pub type Amount = Decimal;

/// Conversion rate between two currencies, derived from committed amounts
pub type Rate = Decimal;

/// Ratio `numerator / denominator` used to derive order rates.
///
/// The denominator must be non-zero; order amounts are validated as strictly
/// positive before any rate is derived from them.
pub fn rate(numerator: Amount, denominator: Amount) -> Result<Rate> {
    numerator.checked_div(denominator).ok_or_else(|| {
        Error::DecimalError(format!("Cannot derive rate {} / {}", numerator, denominator))
    })
}

/// Convert `value` at the ratio `numerator : denominator`, multiplying
/// before dividing so that representable results come out exact.
pub fn convert(value: Amount, numerator: Amount, denominator: Amount) -> Result<Amount> {
    value
        .checked_mul(numerator)
        .and_then(|scaled| scaled.checked_div(denominator))
        .ok_or_else(|| {
            Error::DecimalError(format!(
                "Cannot convert {} at {} / {}",
                value, numerator, denominator
            ))
        })
}

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Default amount precision used for generated and reported amounts
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Round an amount to the standard precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }

    /// Raise an amount to the standard precision, never rounding down.
    /// Amounts already at that precision are returned unchanged.
    pub fn round_amount_up(amount: Amount) -> Amount {
        amount.round_dp_with_strategy(AMOUNT_PRECISION, RoundingStrategy::AwayFromZero)
    }
}
