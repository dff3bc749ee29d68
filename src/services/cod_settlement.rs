//! COD settlement coordinator: the deferred, two-phase settlement for
//! cash collected by delivery agents.
//!
//! Phase A (delivery): the agent is credited their cut immediately,
//! seller payouts are deferred, and the amount the agent now owes the
//! platform is tracked on both the agent record and the platform
//! aggregate.
//!
//! Phase B (remittance): a verified payment is matched FIFO, whole
//! orders at a time, against the agent's still-pending seller
//! commissions. A seller commission is atomically PAID or still
//! PENDING, never partially paid; an unmatched remainder is returned
//! to the caller.

use std::collections::HashMap;

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SettlementError};
use crate::models::{
    Commission, DeliveryAgent, Order, PartyType, PlatformWallet, WalletTransaction,
};
use crate::money;
use crate::services::wallet_writer::{self, WalletEntry};
use crate::services::{breakdown, commission_ledger};

#[derive(Debug, Clone, Serialize)]
pub struct CodDeliveryResult {
    pub order_id: String,
    pub agent_id: String,
    pub agent_commission: f64,
    pub amount_agent_owes_admin: f64,
    pub already_processed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemittanceResult {
    /// Orders fully settled by this remittance.
    pub processed_count: usize,
    pub settled_orders: Vec<String>,
    /// Unconsumed pool: overpayment or a partial-order remainder.
    /// Policy for it belongs to the caller, not the coordinator.
    pub remaining_amount: f64,
}

/// Phase A. Safe to retry: an existing delivery-earning wallet
/// transaction for this order/agent pair makes the call a no-op.
pub fn process_cod_delivery(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<CodDeliveryResult> {
    let order = Order::find(conn, order_id)?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;
    if !order.is_cod() {
        return Err(SettlementError::InvalidPaymentMethod {
            order_id: order_id.to_string(),
            method: order.payment_method.clone(),
            expected: "COD",
        });
    }
    if !order.is_delivered() {
        return Err(SettlementError::OrderNotDelivered(order_id.to_string()));
    }
    let agent_id = order.delivery_agent_id.clone().ok_or_else(|| {
        SettlementError::InvalidState(format!("COD order {order_id} has no delivery agent"))
    })?;

    conn.transaction(|conn| {
        let bd = breakdown::compute_cod_breakdown(conn, order_id)?;
        let owed = bd.amount_agent_owes_admin.unwrap_or(0.0);

        if WalletTransaction::delivery_earning_exists(conn, order_id, &agent_id)? {
            return Ok(CodDeliveryResult {
                order_id: order_id.to_string(),
                agent_id,
                agent_commission: bd.agent_commission,
                amount_agent_owes_admin: owed,
                already_processed: true,
            });
        }

        if !Commission::exists_for_order(conn, order_id)? {
            commission_ledger::create_in_tx(conn, order_id)?;
        }
        let delivery_row = Commission::delivery_row(conn, order_id)?.ok_or_else(|| {
            SettlementError::InvalidState(format!(
                "COD order {order_id} has no delivery commission record"
            ))
        })?;
        if delivery_row.is_pending() {
            Commission::mark_paid(conn, &delivery_row.id)?;
        }

        // The agent is never blocked from earning their cut.
        wallet_writer::credit(
            conn,
            WalletEntry {
                party_id: &agent_id,
                party_type: PartyType::DeliveryBoy,
                amount: money::dec(bd.agent_commission),
                description: format!("Delivery earning for COD order {order_id}"),
                order_id: Some(order_id),
                commission_id: Some(&delivery_row.id),
                reference: None,
            },
        )?;

        let touched = DeliveryAgent::apply_cod_collection(conn, &agent_id, owed, order.total)?;
        if touched == 0 {
            return Err(SettlementError::PartyNotFound {
                kind: "delivery agent",
                id: agent_id.clone(),
            });
        }
        PlatformWallet::add_cod_liability(conn, owed)?;

        info!(
            order_id,
            agent_id,
            agent_commission = bd.agent_commission,
            amount_owed = owed,
            "COD delivery processed, seller payouts deferred"
        );
        Ok(CodDeliveryResult {
            order_id: order_id.to_string(),
            agent_id,
            agent_commission: bd.agent_commission,
            amount_agent_owes_admin: owed,
            already_processed: false,
        })
    })
}

/// Phase B matching. The caller owns the transaction; the
/// payout-verification entry point is [`record_remittance`].
///
/// `amount_paid` is a pool matched FIFO (by commission creation time)
/// against whole orders. An order is consumed only when the remaining
/// pool covers `order total − that order's agent commission` within
/// the 0.01 epsilon; ambiguity always leaves commissions PENDING
/// rather than guessing a split.
pub fn process_pending_cod_payouts(
    conn: &mut SqliteConnection,
    agent_id: &str,
    amount_paid: f64,
) -> Result<RemittanceResult> {
    let orders = Order::delivered_cod_for_agent(conn, agent_id)?;
    let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let orders_by_id: HashMap<&str, &Order> =
        orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let pending = Commission::pending_seller_for_orders(conn, &order_ids)?;

    // FIFO over orders, ordered by their earliest pending commission.
    let mut queue: Vec<&str> = Vec::new();
    for commission in &pending {
        if !queue.contains(&commission.order_id.as_str()) {
            queue.push(commission.order_id.as_str());
        }
    }

    let mut pool = money::round2(money::dec(amount_paid));
    let mut settled_orders = Vec::new();

    for order_id in queue {
        if money::exhausted(pool) {
            break;
        }
        let Some(order) = orders_by_id.get(order_id) else {
            continue;
        };

        let agent_commission = match Commission::delivery_row(conn, order_id)? {
            Some(row) => money::dec(row.commission_amount),
            None => {
                // No delivery row should be impossible for an order
                // with an agent; recompute rather than mis-match.
                warn!(order_id, "missing delivery commission row, recomputing agent cut");
                money::dec(breakdown::compute_cod_breakdown(conn, order_id)?.agent_commission)
            }
        };
        let owed = money::round2(money::dec(order.total) - agent_commission);
        if !money::covers(pool, owed) {
            continue;
        }

        for commission in pending.iter().filter(|c| c.order_id == order_id) {
            Commission::mark_paid(conn, &commission.id)?;
            let seller_id = commission.seller_id.as_deref().ok_or_else(|| {
                SettlementError::InvalidState(format!(
                    "seller commission {} has no seller",
                    commission.id
                ))
            })?;
            let net =
                money::dec(commission.order_amount) - money::dec(commission.commission_amount);
            wallet_writer::credit(
                conn,
                WalletEntry {
                    party_id: seller_id,
                    party_type: PartyType::Seller,
                    amount: net,
                    description: format!("COD sale earning for order {order_id}"),
                    order_id: Some(order_id),
                    commission_id: Some(&commission.id),
                    reference: None,
                },
            )?;
        }

        let bd = breakdown::compute_cod_breakdown(conn, order_id)?;
        PlatformWallet::record_admin_earning(conn, bd.total_admin_earning)?;

        pool = (pool - owed).max(Decimal::ZERO);
        settled_orders.push(order_id.to_string());
    }

    info!(
        agent_id,
        amount_paid,
        settled = settled_orders.len(),
        remaining = %pool,
        "COD remittance matched"
    );
    Ok(RemittanceResult {
        processed_count: settled_orders.len(),
        settled_orders,
        remaining_amount: money::to_f64(pool),
    })
}

/// Payout-verification entry point: owns the transaction, runs the
/// FIFO matching, then reduces the agent's debt and the platform's
/// COD liability by the full verified amount (clamped at zero).
pub fn record_remittance(
    conn: &mut SqliteConnection,
    agent_id: &str,
    amount: f64,
) -> Result<RemittanceResult> {
    if !(amount > 0.0) {
        return Err(SettlementError::InvalidState(
            "remittance amount must be positive".to_string(),
        ));
    }
    if DeliveryAgent::find(conn, agent_id)?.is_none() {
        return Err(SettlementError::PartyNotFound {
            kind: "delivery agent",
            id: agent_id.to_string(),
        });
    }

    conn.transaction(|conn| {
        let result = process_pending_cod_payouts(conn, agent_id, amount)?;
        DeliveryAgent::settle_remittance(conn, agent_id, amount)?;
        PlatformWallet::settle_cod_liability(conn, amount)?;
        info!(agent_id, amount, settled = result.processed_count, "remittance recorded");
        Ok(result)
    })
}
