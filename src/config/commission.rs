//! Hardcoded commission fallbacks.
//!
//! These are the rates of last resort: the rate resolver only reaches
//! them when both the party-level override and the settings row are
//! unavailable. Overridable via environment variables for deployments
//! that want different floor defaults without touching the database.

use std::env;

/// Default seller commission when nothing else resolves (percent).
pub const DEFAULT_SELLER_COMMISSION_PERCENT: f64 = 10.0;

/// Default delivery-agent commission when nothing else resolves
/// (percent of order subtotal).
pub const DEFAULT_DELIVERY_COMMISSION_PERCENT: f64 = 5.0;

fn rate_from_env(var: &str, default: f64) -> f64 {
    match env::var(var).ok().and_then(|v| v.parse::<f64>().ok()) {
        Some(rate) if (0.0..=100.0).contains(&rate) => rate,
        Some(rate) => {
            tracing::warn!(var, rate, "commission rate out of [0, 100], using default");
            default
        }
        None => default,
    }
}

/// Seller commission floor default. Override via `SELLER_COMMISSION_DEFAULT`.
pub fn seller_commission_default() -> f64 {
    rate_from_env("SELLER_COMMISSION_DEFAULT", DEFAULT_SELLER_COMMISSION_PERCENT)
}

/// Delivery-agent commission floor default. Override via `DELIVERY_COMMISSION_DEFAULT`.
pub fn delivery_commission_default() -> f64 {
    rate_from_env(
        "DELIVERY_COMMISSION_DEFAULT",
        DEFAULT_DELIVERY_COMMISSION_PERCENT,
    )
}
