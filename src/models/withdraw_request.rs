//! Withdraw request read model.
//!
//! Owned by the payout UI; the settlement core only reads it for the
//! dashboard fallback recompute ("PAID" rows are cash that already
//! left the platform).

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::withdraw_requests;

pub const STATUS_PAID: &str = "PAID";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = withdraw_requests)]
pub struct WithdrawRequest {
    pub id: String,
    pub party_id: String,
    pub party_type: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = withdraw_requests)]
pub struct NewWithdrawRequest {
    pub id: String,
    pub party_id: String,
    pub party_type: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl NewWithdrawRequest {
    pub fn paid(party_id: &str, party_type: &str, amount: f64) -> Self {
        let now = super::timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            party_id: party_id.to_string(),
            party_type: party_type.to_string(),
            amount,
            status: STATUS_PAID.to_string(),
            created_at: now.clone(),
            processed_at: Some(now),
        }
    }
}

impl WithdrawRequest {
    pub fn create(conn: &mut SqliteConnection, new: NewWithdrawRequest) -> QueryResult<Self> {
        diesel::insert_into(withdraw_requests::table)
            .values(&new)
            .execute(conn)?;
        withdraw_requests::table.find(new.id).first(conn)
    }

    /// Sum of processed payouts, i.e. platform cash outflows.
    pub fn sum_paid(conn: &mut SqliteConnection) -> QueryResult<f64> {
        let sum: Option<f64> = withdraw_requests::table
            .filter(withdraw_requests::status.eq(STATUS_PAID))
            .select(diesel::dsl::sum(withdraw_requests::amount))
            .first(conn)?;
        Ok(sum.unwrap_or(0.0))
    }
}
