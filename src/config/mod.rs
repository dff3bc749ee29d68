//! Configuration modules for the settlement server.

pub mod commission;

pub use commission::{
    delivery_commission_default, seller_commission_default, DEFAULT_DELIVERY_COMMISSION_PERCENT,
    DEFAULT_SELLER_COMMISSION_PERCENT,
};
