//! Commission ledger records.
//!
//! One SELLER row per order item, one DELIVERY_BOY row per
//! order-with-agent. Rows are never deleted; the lifecycle is
//! PENDING -> PAID -> CANCELLED (creation may start at PAID for prepaid
//! seller rows), and nothing re-enters PENDING.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::commissions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    Seller,
    DeliveryBoy,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Seller => "SELLER",
            CommissionType::DeliveryBoy => "DELIVERY_BOY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "PENDING",
            CommissionStatus::Paid => "PAID",
            CommissionStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = commissions)]
pub struct Commission {
    pub id: String,
    pub order_id: String,
    pub order_item_id: Option<String>,
    pub seller_id: Option<String>,
    pub delivery_agent_id: Option<String>,
    pub commission_type: String,
    /// Base the commission was computed from: the item line total for
    /// SELLER rows, the order subtotal (or distance) for DELIVERY_BOY.
    pub order_amount: f64,
    /// Percent, or per-km rate on the distance-based delivery path.
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub status: String,
    pub paid_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = commissions)]
pub struct NewCommission {
    pub id: String,
    pub order_id: String,
    pub order_item_id: Option<String>,
    pub seller_id: Option<String>,
    pub delivery_agent_id: Option<String>,
    pub commission_type: String,
    pub order_amount: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub status: String,
    pub paid_at: Option<String>,
    pub created_at: String,
}

impl NewCommission {
    pub fn seller(
        order_id: &str,
        order_item_id: &str,
        seller_id: &str,
        order_amount: f64,
        rate: f64,
        amount: f64,
        status: CommissionStatus,
    ) -> Self {
        let now = super::timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            order_item_id: Some(order_item_id.to_string()),
            seller_id: Some(seller_id.to_string()),
            delivery_agent_id: None,
            commission_type: CommissionType::Seller.as_str().to_string(),
            order_amount,
            commission_rate: rate,
            commission_amount: amount,
            status: status.as_str().to_string(),
            paid_at: (status == CommissionStatus::Paid).then(|| now.clone()),
            created_at: now,
        }
    }

    pub fn delivery_boy(
        order_id: &str,
        agent_id: &str,
        order_amount: f64,
        rate: f64,
        amount: f64,
        status: CommissionStatus,
    ) -> Self {
        let now = super::timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            order_item_id: None,
            seller_id: None,
            delivery_agent_id: Some(agent_id.to_string()),
            commission_type: CommissionType::DeliveryBoy.as_str().to_string(),
            order_amount,
            commission_rate: rate,
            commission_amount: amount,
            status: status.as_str().to_string(),
            paid_at: (status == CommissionStatus::Paid).then(|| now.clone()),
            created_at: now,
        }
    }
}

impl Commission {
    pub fn create(conn: &mut SqliteConnection, new: NewCommission) -> QueryResult<Self> {
        diesel::insert_into(commissions::table)
            .values(&new)
            .execute(conn)?;
        commissions::table.find(new.id).first(conn)
    }

    pub fn exists_for_order(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<bool> {
        let count: i64 = commissions::table
            .filter(commissions::order_id.eq(order_id))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    pub fn for_order(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<Vec<Self>> {
        commissions::table
            .filter(commissions::order_id.eq(order_id))
            .order((commissions::created_at.asc(), commissions::id.asc()))
            .load(conn)
    }

    /// The order's DELIVERY_BOY row, if any.
    pub fn delivery_row(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<Option<Self>> {
        commissions::table
            .filter(commissions::order_id.eq(order_id))
            .filter(commissions::commission_type.eq(CommissionType::DeliveryBoy.as_str()))
            .first(conn)
            .optional()
    }

    /// Pending SELLER rows across a set of orders, FIFO by creation
    /// time. Drives the remittance matching scan.
    pub fn pending_seller_for_orders(
        conn: &mut SqliteConnection,
        order_ids: &[String],
    ) -> QueryResult<Vec<Self>> {
        commissions::table
            .filter(commissions::order_id.eq_any(order_ids))
            .filter(commissions::commission_type.eq(CommissionType::Seller.as_str()))
            .filter(commissions::status.eq(CommissionStatus::Pending.as_str()))
            .order((commissions::created_at.asc(), commissions::id.asc()))
            .load(conn)
    }

    pub fn mark_paid(conn: &mut SqliteConnection, commission_id: &str) -> QueryResult<usize> {
        diesel::update(commissions::table.find(commission_id))
            .set((
                commissions::status.eq(CommissionStatus::Paid.as_str()),
                commissions::paid_at.eq(super::timestamp()),
            ))
            .execute(conn)
    }

    pub fn mark_cancelled(conn: &mut SqliteConnection, commission_id: &str) -> QueryResult<usize> {
        diesel::update(commissions::table.find(commission_id))
            .set(commissions::status.eq(CommissionStatus::Cancelled.as_str()))
            .execute(conn)
    }

    pub fn for_seller(conn: &mut SqliteConnection, seller_id: &str) -> QueryResult<Vec<Self>> {
        commissions::table
            .filter(commissions::seller_id.eq(seller_id))
            .order(commissions::created_at.desc())
            .load(conn)
    }

    pub fn for_agent(conn: &mut SqliteConnection, agent_id: &str) -> QueryResult<Vec<Self>> {
        commissions::table
            .filter(commissions::delivery_agent_id.eq(agent_id))
            .order(commissions::created_at.desc())
            .load(conn)
    }

    pub fn is_pending(&self) -> bool {
        self.status == CommissionStatus::Pending.as_str()
    }

    pub fn is_paid(&self) -> bool {
        self.status == CommissionStatus::Paid.as_str()
    }

    pub fn is_seller(&self) -> bool {
        self.commission_type == CommissionType::Seller.as_str()
    }

    pub fn is_delivery(&self) -> bool {
        self.commission_type == CommissionType::DeliveryBoy.as_str()
    }
}
