//! Amount handling in the processor's minor currency unit.
//!
//! Amounts are stored and transmitted as integer minor units (pesewas, kobo).
//! [`Decimal`] only appears at the edges, where organizers enter prices and
//! responses display them.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::{AppError, AppResult};

/// Minor units in one major unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount (e.g. `2.00`) to minor units (`200`).
///
/// Rejects amounts with sub-minor precision instead of rounding them.
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    let scaled = amount * Decimal::from(MINOR_UNITS_PER_MAJOR);
    if scaled.fract() != Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "Amount {amount} has more than two decimal places"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| AppError::Validation(format!("Amount {amount} is out of range")))
}

/// Convert minor units back to a major-unit amount with two decimal places.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Total charge for `quantity` votes at `price_per_vote_minor` each.
pub fn charge_amount(price_per_vote_minor: i64, quantity: i32) -> AppResult<i64> {
    price_per_vote_minor
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::Validation("Charge amount overflows".to_string()))
}
