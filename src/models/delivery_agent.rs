//! Delivery agent model.
//!
//! Besides the withdrawable `balance`, an agent carries two COD
//! bookkeeping fields: `pending_admin_payout` (cash owed to the
//! platform from undelivered remittances) and `cash_collected` (cash
//! currently in the agent's physical possession).

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::delivery_agents;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
#[diesel(table_name = delivery_agents)]
pub struct DeliveryAgent {
    pub id: String,
    pub name: String,
    /// Agent-specific commission override in percent of order subtotal.
    pub commission_rate: Option<f64>,
    pub balance: f64,
    pub pending_admin_payout: f64,
    pub cash_collected: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = delivery_agents)]
pub struct NewDeliveryAgent {
    pub id: String,
    pub name: String,
    pub commission_rate: Option<f64>,
    pub balance: f64,
    pub pending_admin_payout: f64,
    pub cash_collected: f64,
    pub created_at: String,
}

impl NewDeliveryAgent {
    pub fn new(name: &str, commission_rate: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            commission_rate,
            balance: 0.0,
            pending_admin_payout: 0.0,
            cash_collected: 0.0,
            created_at: super::timestamp(),
        }
    }
}

impl DeliveryAgent {
    pub fn create(conn: &mut SqliteConnection, new: NewDeliveryAgent) -> QueryResult<Self> {
        diesel::insert_into(delivery_agents::table)
            .values(&new)
            .execute(conn)?;
        delivery_agents::table.find(new.id).first(conn)
    }

    pub fn find(conn: &mut SqliteConnection, agent_id: &str) -> QueryResult<Option<Self>> {
        delivery_agents::table.find(agent_id).first(conn).optional()
    }

    pub fn adjust_balance(
        conn: &mut SqliteConnection,
        agent_id: &str,
        delta: f64,
    ) -> QueryResult<usize> {
        diesel::update(delivery_agents::table.find(agent_id))
            .set(delivery_agents::balance.eq(delivery_agents::balance + delta))
            .execute(conn)
    }

    /// Record a COD collection: the agent now owes `owed` to the
    /// platform and holds `collected` in cash.
    pub fn apply_cod_collection(
        conn: &mut SqliteConnection,
        agent_id: &str,
        owed: f64,
        collected: f64,
    ) -> QueryResult<usize> {
        diesel::update(delivery_agents::table.find(agent_id))
            .set((
                delivery_agents::pending_admin_payout
                    .eq(delivery_agents::pending_admin_payout + owed),
                delivery_agents::cash_collected.eq(delivery_agents::cash_collected + collected),
            ))
            .execute(conn)
    }

    /// Reduce the agent's COD debt by a verified remittance amount,
    /// clamped at zero on both fields.
    pub fn settle_remittance(
        conn: &mut SqliteConnection,
        agent_id: &str,
        amount: f64,
    ) -> QueryResult<usize> {
        let agent: Option<Self> = delivery_agents::table.find(agent_id).first(conn).optional()?;
        let Some(agent) = agent else { return Ok(0) };
        let pending = (agent.pending_admin_payout - amount).max(0.0);
        let cash = (agent.cash_collected - amount).max(0.0);
        diesel::update(delivery_agents::table.find(agent_id))
            .set((
                delivery_agents::pending_admin_payout.eq(pending),
                delivery_agents::cash_collected.eq(cash),
            ))
            .execute(conn)
    }

    /// Back out a COD collection on order reversal: the agent returns
    /// the cash to the customer, so the debt and the cash-in-hand both
    /// shrink (clamped at zero).
    pub fn reverse_cod_collection(
        conn: &mut SqliteConnection,
        agent_id: &str,
        owed: f64,
        collected: f64,
    ) -> QueryResult<usize> {
        let agent: Option<Self> = delivery_agents::table.find(agent_id).first(conn).optional()?;
        let Some(agent) = agent else { return Ok(0) };
        let pending = (agent.pending_admin_payout - owed).max(0.0);
        let cash = (agent.cash_collected - collected).max(0.0);
        diesel::update(delivery_agents::table.find(agent_id))
            .set((
                delivery_agents::pending_admin_payout.eq(pending),
                delivery_agents::cash_collected.eq(cash),
            ))
            .execute(conn)
    }

    pub fn sum_balances(conn: &mut SqliteConnection) -> QueryResult<f64> {
        let sum: Option<f64> = delivery_agents::table
            .select(diesel::dsl::sum(delivery_agents::balance))
            .first(conn)?;
        Ok(sum.unwrap_or(0.0))
    }
}
