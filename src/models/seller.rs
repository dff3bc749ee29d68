//! Seller model: per-seller commission override and withdrawable balance.
//!
//! `balance` is mutated only by the wallet writer; the matching
//! `wallet_transactions` rows are the audit trail for every change.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::sellers;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = sellers)]
pub struct Seller {
    pub id: String,
    pub name: String,
    /// Seller-specific commission override in percent; `None` or `<= 0`
    /// falls through to the global default.
    pub commission_rate: Option<f64>,
    pub balance: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sellers)]
pub struct NewSeller {
    pub id: String,
    pub name: String,
    pub commission_rate: Option<f64>,
    pub balance: f64,
    pub created_at: String,
}

impl NewSeller {
    pub fn new(name: &str, commission_rate: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            commission_rate,
            balance: 0.0,
            created_at: super::timestamp(),
        }
    }
}

impl Seller {
    pub fn create(conn: &mut SqliteConnection, new: NewSeller) -> QueryResult<Self> {
        diesel::insert_into(sellers::table)
            .values(&new)
            .execute(conn)?;
        sellers::table.find(new.id).first(conn)
    }

    pub fn find(conn: &mut SqliteConnection, seller_id: &str) -> QueryResult<Option<Self>> {
        sellers::table.find(seller_id).first(conn).optional()
    }

    /// Apply a signed balance delta. Returns the number of rows
    /// touched; 0 means the seller does not exist.
    pub fn adjust_balance(
        conn: &mut SqliteConnection,
        seller_id: &str,
        delta: f64,
    ) -> QueryResult<usize> {
        diesel::update(sellers::table.find(seller_id))
            .set(sellers::balance.eq(sellers::balance + delta))
            .execute(conn)
    }

    pub fn sum_balances(conn: &mut SqliteConnection) -> QueryResult<f64> {
        let sum: Option<f64> = sellers::table
            .select(diesel::dsl::sum(sellers::balance))
            .first(conn)?;
        Ok(sum.unwrap_or(0.0))
    }
}
