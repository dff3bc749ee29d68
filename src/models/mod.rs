//! Persistence models.
//!
//! Each model owns its table's queries, following the pattern of
//! associated functions taking `&mut SqliteConnection`. Status and
//! type columns are stored as TEXT; the typed enums next to each model
//! are the only place those strings are spelled out.

pub mod category;
pub mod commission;
pub mod delivery_agent;
pub mod order;
pub mod platform_wallet;
pub mod product;
pub mod seller;
pub mod settings;
pub mod wallet_transaction;
pub mod withdraw_request;

pub use category::{Category, NewCategory};
pub use commission::{Commission, CommissionStatus, CommissionType, NewCommission};
pub use delivery_agent::{DeliveryAgent, NewDeliveryAgent};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, PaymentMethod};
pub use platform_wallet::PlatformWallet;
pub use product::{NewProduct, Product};
pub use seller::{NewSeller, Seller};
pub use settings::Settings;
pub use wallet_transaction::{NewWalletTransaction, PartyType, TxnType, WalletTransaction};
pub use withdraw_request::{NewWithdrawRequest, WithdrawRequest};

/// Wall-clock timestamp for TEXT columns. Microsecond precision so
/// insertion order survives `ORDER BY created_at`.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
