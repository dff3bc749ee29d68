//! Error taxonomy for the settlement core.
//!
//! Rate/settings lookups never surface here: a commission calculation
//! must not block an order from being marked delivered, so those paths
//! log and substitute safe defaults instead of failing.

use actix_web::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("{kind} {id} not found")]
    PartyNotFound { kind: &'static str, id: String },

    #[error("commission {0} not found")]
    CommissionNotFound(String),

    #[error("order {0} is not delivered")]
    OrderNotDelivered(String),

    #[error("order {order_id} has payment method {method}, expected {expected}")]
    InvalidPaymentMethod {
        order_id: String,
        method: String,
        expected: &'static str,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Any write failure inside a settlement transaction. The whole
    /// transaction rolls back; callers may retry the operation since
    /// every entry point is idempotent.
    #[error("transaction aborted: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

impl SettlementError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SettlementError::OrderNotFound(_)
            | SettlementError::PartyNotFound { .. }
            | SettlementError::CommissionNotFound(_) => StatusCode::NOT_FOUND,
            SettlementError::OrderNotDelivered(_)
            | SettlementError::InvalidPaymentMethod { .. }
            | SettlementError::InvalidState(_) => StatusCode::BAD_REQUEST,
            SettlementError::Database(_) | SettlementError::Pool(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type Result<T, E = SettlementError> = std::result::Result<T, E>;
