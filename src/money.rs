//! Monetary arithmetic helpers.
//!
//! All calculations run on `Decimal` internally and are converted to
//! `f64` only at storage/serialization boundaries, rounded to 2 decimal
//! places with half-up semantics. Repeated settlement runs therefore
//! never accumulate floating error past the epsilon used for matching.

use rust_decimal::prelude::*;

/// Rounding precision for persisted monetary values.
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01).
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert a stored `f64` into a `Decimal`. Non-finite input is treated
/// as zero; money columns are written by this crate only, so a NaN here
/// means corrupted data, not a caller mistake.
pub fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::warn!(value, "non-finite monetary value read, treating as zero");
        Decimal::ZERO
    })
}

/// Round half-up to 2 decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounded `f64` for persistence/serialization.
pub fn to_f64(value: Decimal) -> f64 {
    round2(value).to_f64().unwrap_or(0.0)
}

/// `amount × rate%`.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Whether `pool` still holds settleable money.
pub fn exhausted(pool: Decimal) -> bool {
    pool <= EPSILON
}

/// Whether `pool` covers `amount` within the matching tolerance.
pub fn covers(pool: Decimal, amount: Decimal) -> bool {
    pool >= amount - EPSILON
}
