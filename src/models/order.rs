//! Order and order-item read models.
//!
//! Orders are owned by the order-placement subsystem; the settlement
//! core reads them and reacts to the `DELIVERED` transition. The only
//! writes this crate performs here are pinning the resolved commission
//! rate/amount onto order items once computed.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{order_items, orders};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Prepaid,
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Prepaid => "PREPAID",
            PaymentMethod::Cod => "COD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PREPAID" => Some(PaymentMethod::Prepaid),
            "COD" => Some(PaymentMethod::Cod),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: String,
    pub payment_method: String,
    pub status: String,
    pub subtotal: f64,
    pub platform_fee: f64,
    pub shipping_charge: f64,
    pub total: f64,
    pub delivery_agent_id: Option<String>,
    pub delivery_distance_km: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub id: String,
    pub payment_method: String,
    pub status: String,
    pub subtotal: f64,
    pub platform_fee: f64,
    pub shipping_charge: f64,
    pub total: f64,
    pub delivery_agent_id: Option<String>,
    pub delivery_distance_km: Option<f64>,
    pub created_at: String,
}

impl NewOrder {
    pub fn new(method: PaymentMethod, subtotal: f64, platform_fee: f64, shipping: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payment_method: method.as_str().to_string(),
            status: OrderStatus::Pending.as_str().to_string(),
            subtotal,
            platform_fee,
            shipping_charge: shipping,
            total: subtotal + platform_fee + shipping,
            delivery_agent_id: None,
            delivery_distance_km: None,
            created_at: super::timestamp(),
        }
    }
}

impl Order {
    pub fn create(conn: &mut SqliteConnection, new: NewOrder) -> QueryResult<Self> {
        diesel::insert_into(orders::table)
            .values(&new)
            .execute(conn)?;
        orders::table.find(new.id).first(conn)
    }

    pub fn find(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<Option<Self>> {
        orders::table.find(order_id).first(conn).optional()
    }

    pub fn set_status(
        conn: &mut SqliteConnection,
        order_id: &str,
        status: OrderStatus,
    ) -> QueryResult<usize> {
        diesel::update(orders::table.find(order_id))
            .set(orders::status.eq(status.as_str()))
            .execute(conn)
    }

    pub fn items(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<Vec<OrderItem>> {
        order_items::table
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::id.asc())
            .load(conn)
    }

    /// Delivered COD orders assigned to an agent, oldest first. Cash
    /// exists only for delivered orders, so the remittance scan must
    /// never see an undelivered one even when its commission records
    /// already exist. Backed by the `(delivery_agent_id,
    /// payment_method)` index; the scan is unbounded.
    pub fn delivered_cod_for_agent(
        conn: &mut SqliteConnection,
        agent_id: &str,
    ) -> QueryResult<Vec<Self>> {
        orders::table
            .filter(orders::delivery_agent_id.eq(agent_id))
            .filter(orders::payment_method.eq(PaymentMethod::Cod.as_str()))
            .filter(orders::status.eq(OrderStatus::Delivered.as_str()))
            .order(orders::created_at.asc())
            .load(conn)
    }

    pub fn delivered(conn: &mut SqliteConnection) -> QueryResult<Vec<Self>> {
        orders::table
            .filter(orders::status.eq(OrderStatus::Delivered.as_str()))
            .order(orders::created_at.asc())
            .load(conn)
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.payment_method)
    }

    pub fn is_cod(&self) -> bool {
        self.payment_method() == Some(PaymentMethod::Cod)
    }

    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Associations)]
#[diesel(table_name = order_items, belongs_to(Order))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total: f64,
    /// Commission rate pinned at first breakdown computation; repeated
    /// runs reuse it instead of re-resolving.
    pub commission_rate: Option<f64>,
    pub commission_amount: Option<f64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total: f64,
    pub commission_rate: Option<f64>,
    pub commission_amount: Option<f64>,
}

impl NewOrderItem {
    pub fn new(order_id: &str, product_id: &str, seller_id: &str, qty: i32, unit: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            seller_id: seller_id.to_string(),
            quantity: qty,
            unit_price: unit,
            total: unit * qty as f64,
            commission_rate: None,
            commission_amount: None,
        }
    }
}

impl OrderItem {
    pub fn create(conn: &mut SqliteConnection, new: NewOrderItem) -> QueryResult<Self> {
        diesel::insert_into(order_items::table)
            .values(&new)
            .execute(conn)?;
        order_items::table.find(new.id).first(conn)
    }

    pub fn pin_commission(
        conn: &mut SqliteConnection,
        item_id: &str,
        rate: f64,
        amount: f64,
    ) -> QueryResult<usize> {
        diesel::update(order_items::table.find(item_id))
            .set((
                order_items::commission_rate.eq(rate),
                order_items::commission_amount.eq(amount),
            ))
            .execute(conn)
    }
}
