//! Append-only wallet transaction audit trail.
//!
//! Rows are created and never mutated. The reconciliation invariant:
//! the signed sum of a party's transactions equals their current
//! balance.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::wallet_transactions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    Seller,
    DeliveryBoy,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Seller => "SELLER",
            PartyType::DeliveryBoy => "DELIVERY_BOY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SELLER" => Some(PartyType::Seller),
            "DELIVERY_BOY" => Some(PartyType::DeliveryBoy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnType {
    Credit,
    Debit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Credit => "CREDIT",
            TxnType::Debit => "DEBIT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = wallet_transactions)]
pub struct WalletTransaction {
    pub id: String,
    pub party_id: String,
    pub party_type: String,
    pub amount: f64,
    pub txn_type: String,
    pub description: String,
    pub status: String,
    pub order_id: Option<String>,
    pub commission_id: Option<String>,
    pub reference: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_transactions)]
pub struct NewWalletTransaction {
    pub id: String,
    pub party_id: String,
    pub party_type: String,
    pub amount: f64,
    pub txn_type: String,
    pub description: String,
    pub status: String,
    pub order_id: Option<String>,
    pub commission_id: Option<String>,
    pub reference: Option<String>,
    pub created_at: String,
}

impl NewWalletTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        party_id: &str,
        party_type: PartyType,
        amount: f64,
        txn_type: TxnType,
        description: String,
        order_id: Option<&str>,
        commission_id: Option<&str>,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            party_id: party_id.to_string(),
            party_type: party_type.as_str().to_string(),
            amount,
            txn_type: txn_type.as_str().to_string(),
            description,
            status: "COMPLETED".to_string(),
            order_id: order_id.map(|s| s.to_string()),
            commission_id: commission_id.map(|s| s.to_string()),
            reference,
            created_at: super::timestamp(),
        }
    }
}

impl WalletTransaction {
    pub fn create(conn: &mut SqliteConnection, new: NewWalletTransaction) -> QueryResult<Self> {
        diesel::insert_into(wallet_transactions::table)
            .values(&new)
            .execute(conn)?;
        wallet_transactions::table.find(new.id).first(conn)
    }

    pub fn for_order(conn: &mut SqliteConnection, order_id: &str) -> QueryResult<Vec<Self>> {
        wallet_transactions::table
            .filter(wallet_transactions::order_id.eq(order_id))
            .order(wallet_transactions::created_at.asc())
            .load(conn)
    }

    pub fn for_party(
        conn: &mut SqliteConnection,
        party_id: &str,
        party_type: PartyType,
    ) -> QueryResult<Vec<Self>> {
        wallet_transactions::table
            .filter(wallet_transactions::party_id.eq(party_id))
            .filter(wallet_transactions::party_type.eq(party_type.as_str()))
            .order(wallet_transactions::created_at.desc())
            .load(conn)
    }

    /// Idempotency guard for COD delivery processing: has the agent
    /// already been credited their earning for this order?
    pub fn delivery_earning_exists(
        conn: &mut SqliteConnection,
        order_id: &str,
        agent_id: &str,
    ) -> QueryResult<bool> {
        let count: i64 = wallet_transactions::table
            .filter(wallet_transactions::order_id.eq(order_id))
            .filter(wallet_transactions::party_id.eq(agent_id))
            .filter(wallet_transactions::party_type.eq(PartyType::DeliveryBoy.as_str()))
            .filter(wallet_transactions::txn_type.eq(TxnType::Credit.as_str()))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }
}
