//! Commission ledger: creation, distribution and reversal of
//! commission records, plus the per-party summary.
//!
//! Lifecycle per record: PENDING -> PAID (distribution/settlement),
//! PAID -> CANCELLED (reversal), PENDING -> CANCELLED (reversal before
//! payout). Prepaid seller rows are born PAID because the money has
//! already cleared through the platform. Admin earning is recognized
//! on the platform aggregate at settlement time: product commission
//! and platform fee when prepaid seller rows are credited, the
//! delivery share when the agent row is paid out, and the full admin
//! earning of a COD order when its remittance is matched.

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, SettlementError};
use crate::models::{
    Commission, CommissionStatus, NewCommission, Order, OrderItem, PartyType, PlatformWallet,
};
use crate::money;
use crate::services::wallet_writer::{self, WalletEntry};
use crate::services::{breakdown, cod_settlement};

#[derive(Debug, Clone, Serialize)]
pub struct CreationResult {
    pub order_id: String,
    pub created: usize,
    pub already_existed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionResult {
    pub order_id: String,
    pub distributed: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReversalResult {
    pub order_id: String,
    pub reversed: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommissionSummary {
    pub total: f64,
    pub paid: f64,
    pub pending: f64,
    pub commissions: Vec<Commission>,
}

/// Create the order's commission records. Idempotent: if any record
/// already exists for the order this is a no-op.
pub fn create_order_commissions(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<CreationResult> {
    conn.transaction(|conn| create_in_tx(conn, order_id))
}

pub(crate) fn create_in_tx(conn: &mut SqliteConnection, order_id: &str) -> Result<CreationResult> {
    let order = Order::find(conn, order_id)?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;

    if Commission::exists_for_order(conn, order_id)? {
        return Ok(CreationResult {
            order_id: order_id.to_string(),
            created: 0,
            already_existed: true,
        });
    }

    let bd = breakdown::compute_breakdown(conn, order_id)?;
    let prepaid = !order.is_cod();
    let mut created = 0;

    for line in &bd.items {
        let status = if prepaid {
            CommissionStatus::Paid
        } else {
            CommissionStatus::Pending
        };
        let commission = Commission::create(
            conn,
            NewCommission::seller(
                order_id,
                &line.order_item_id,
                &line.seller_id,
                line.line_total,
                line.rate,
                line.commission,
                status,
            ),
        )?;
        OrderItem::pin_commission(conn, &line.order_item_id, line.rate, line.commission)?;
        created += 1;

        if prepaid {
            wallet_writer::credit(
                conn,
                WalletEntry {
                    party_id: &line.seller_id,
                    party_type: PartyType::Seller,
                    amount: money::dec(line.seller_earning),
                    description: format!("Sale earning for order {order_id}"),
                    order_id: Some(order_id),
                    commission_id: Some(&commission.id),
                    reference: None,
                },
            )?;
        }
    }

    if let Some(agent_id) = order.delivery_agent_id.as_deref() {
        let base = if bd.distance_based {
            order.delivery_distance_km.unwrap_or(0.0)
        } else {
            order.subtotal
        };
        Commission::create(
            conn,
            NewCommission::delivery_boy(
                order_id,
                agent_id,
                base,
                bd.agent_rate,
                bd.agent_commission,
                CommissionStatus::Pending,
            ),
        )?;
        created += 1;
    }

    if prepaid {
        // Prepaid cash is already in the platform's hands; product
        // commission and platform fee are recognized now. The delivery
        // share follows when the agent row is paid at distribution, or
        // immediately if no agent will ever earn it.
        let mut recognized = money::dec(bd.admin_product_commission) + money::dec(bd.platform_fee);
        if order.delivery_agent_id.is_none() {
            recognized += money::dec(bd.admin_delivery_share);
        }
        PlatformWallet::record_admin_earning(conn, money::to_f64(recognized))?;
    }

    info!(order_id, created, prepaid, "commission records created");
    Ok(CreationResult {
        order_id: order_id.to_string(),
        created,
        already_existed: false,
    })
}

/// Pay out the order's pending commissions. Requires the order to be
/// delivered; COD orders are delegated to the settlement coordinator
/// (sellers stay deferred until the agent remits).
pub fn distribute_commissions(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> Result<DistributionResult> {
    let order = Order::find(conn, order_id)?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;
    if !order.is_delivered() {
        return Err(SettlementError::OrderNotDelivered(order_id.to_string()));
    }

    if order.is_cod() {
        let result = cod_settlement::process_cod_delivery(conn, order_id)?;
        return Ok(DistributionResult {
            order_id: order_id.to_string(),
            distributed: usize::from(!result.already_processed),
            message: "COD order: agent settled, seller payouts deferred until remittance"
                .to_string(),
        });
    }

    conn.transaction(|conn| {
        if !Commission::exists_for_order(conn, order_id)? {
            create_in_tx(conn, order_id)?;
        }
        let bd = breakdown::compute_breakdown(conn, order_id)?;
        let mut flipped = 0;

        for commission in Commission::for_order(conn, order_id)? {
            if !commission.is_pending() {
                continue;
            }
            Commission::mark_paid(conn, &commission.id)?;
            if commission.is_delivery() {
                let agent_id = commission.delivery_agent_id.as_deref().ok_or_else(|| {
                    SettlementError::InvalidState(format!(
                        "delivery commission {} has no agent",
                        commission.id
                    ))
                })?;
                wallet_writer::credit(
                    conn,
                    WalletEntry {
                        party_id: agent_id,
                        party_type: PartyType::DeliveryBoy,
                        amount: money::dec(commission.commission_amount),
                        description: format!("Delivery earning for order {order_id}"),
                        order_id: Some(order_id),
                        commission_id: Some(&commission.id),
                        reference: None,
                    },
                )?;
                PlatformWallet::record_admin_earning(conn, bd.admin_delivery_share)?;
            } else {
                let seller_id = commission.seller_id.as_deref().ok_or_else(|| {
                    SettlementError::InvalidState(format!(
                        "seller commission {} has no seller",
                        commission.id
                    ))
                })?;
                let net = money::dec(commission.order_amount)
                    - money::dec(commission.commission_amount);
                wallet_writer::credit(
                    conn,
                    WalletEntry {
                        party_id: seller_id,
                        party_type: PartyType::Seller,
                        amount: net,
                        description: format!("Sale earning for order {order_id}"),
                        order_id: Some(order_id),
                        commission_id: Some(&commission.id),
                        reference: None,
                    },
                )?;
            }
            flipped += 1;
        }

        let message = if flipped == 0 {
            "commissions already distributed".to_string()
        } else {
            format!("{flipped} commission(s) distributed")
        };
        info!(order_id, flipped, "commission distribution finished");
        Ok(DistributionResult {
            order_id: order_id.to_string(),
            distributed: flipped,
            message,
        })
    })
}

/// Reverse the order's commissions after cancellation/return. Every
/// PAID record is cancelled with a compensating debit; PENDING records
/// are cancelled without money movement. Reversing an order with no
/// commissions is a successful no-op.
pub fn reverse_commissions(conn: &mut SqliteConnection, order_id: &str) -> Result<ReversalResult> {
    let order = Order::find(conn, order_id)?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;

    conn.transaction(|conn| {
        let commissions = Commission::for_order(conn, order_id)?;
        if commissions.is_empty() {
            return Ok(ReversalResult {
                order_id: order_id.to_string(),
                reversed: 0,
                message: "no commissions to reverse".to_string(),
            });
        }

        let bd = breakdown::compute_breakdown(conn, order_id)?;
        let sellers_were_paid = commissions.iter().any(|c| c.is_seller() && c.is_paid());
        let sellers_were_pending = commissions.iter().any(|c| c.is_seller() && c.is_pending());
        let agent_was_paid = commissions.iter().any(|c| c.is_delivery() && c.is_paid());
        let mut reversed = 0;

        for commission in &commissions {
            if commission.status == CommissionStatus::Cancelled.as_str() {
                continue;
            }
            if commission.is_paid() {
                if commission.is_delivery() {
                    let agent_id = commission.delivery_agent_id.as_deref().ok_or_else(|| {
                        SettlementError::InvalidState(format!(
                            "delivery commission {} has no agent",
                            commission.id
                        ))
                    })?;
                    wallet_writer::debit(
                        conn,
                        WalletEntry {
                            party_id: agent_id,
                            party_type: PartyType::DeliveryBoy,
                            amount: money::dec(commission.commission_amount),
                            description: format!("Reversal of delivery earning for order {order_id}"),
                            order_id: Some(order_id),
                            commission_id: Some(&commission.id),
                            reference: None,
                        },
                    )?;
                } else {
                    let seller_id = commission.seller_id.as_deref().ok_or_else(|| {
                        SettlementError::InvalidState(format!(
                            "seller commission {} has no seller",
                            commission.id
                        ))
                    })?;
                    let net = money::dec(commission.order_amount)
                        - money::dec(commission.commission_amount);
                    wallet_writer::debit(
                        conn,
                        WalletEntry {
                            party_id: seller_id,
                            party_type: PartyType::Seller,
                            amount: net,
                            description: format!("Reversal of sale earning for order {order_id}"),
                            order_id: Some(order_id),
                            commission_id: Some(&commission.id),
                            reference: None,
                        },
                    )?;
                }
            }
            Commission::mark_cancelled(conn, &commission.id)?;
            reversed += 1;
        }

        // Unwind whatever earning had been recognized for this order.
        let mut unwind = Decimal::ZERO;
        if order.is_cod() {
            if sellers_were_paid {
                unwind += money::dec(bd.total_admin_earning);
            }
            if sellers_were_pending && agent_was_paid {
                // Phase A ran but the remittance never matched: drop
                // the outstanding liability, the agent hands the cash
                // back to the customer. The agent cut comes from the
                // persisted row, not a recompute, so a settings change
                // since Phase A cannot skew the unwind.
                let agent_cut = commissions
                    .iter()
                    .find(|c| c.is_delivery())
                    .map(|c| money::dec(c.commission_amount))
                    .unwrap_or_else(|| money::dec(bd.agent_commission));
                let owed = money::dec(order.total) - agent_cut;
                PlatformWallet::settle_cod_liability(conn, money::to_f64(owed))?;
                if let Some(agent_id) = order.delivery_agent_id.as_deref() {
                    crate::models::DeliveryAgent::reverse_cod_collection(
                        conn,
                        agent_id,
                        money::to_f64(owed),
                        order.total,
                    )?;
                }
            }
        } else {
            if sellers_were_paid {
                unwind +=
                    money::dec(bd.admin_product_commission) + money::dec(bd.platform_fee);
                if order.delivery_agent_id.is_none() {
                    unwind += money::dec(bd.admin_delivery_share);
                }
            }
            if agent_was_paid {
                unwind += money::dec(bd.admin_delivery_share);
            }
        }
        if unwind != Decimal::ZERO {
            PlatformWallet::unwind_admin_earning(conn, money::to_f64(unwind))?;
        }

        info!(order_id, reversed, "commissions reversed");
        Ok(ReversalResult {
            order_id: order_id.to_string(),
            reversed,
            message: format!("{reversed} commission(s) reversed"),
        })
    })
}

/// Per-party totals and history for the payout UI.
pub fn commission_summary(
    conn: &mut SqliteConnection,
    party_id: &str,
    party_type: PartyType,
) -> Result<CommissionSummary> {
    let commissions = match party_type {
        PartyType::Seller => {
            if crate::models::Seller::find(conn, party_id)?.is_none() {
                return Err(SettlementError::PartyNotFound {
                    kind: "seller",
                    id: party_id.to_string(),
                });
            }
            Commission::for_seller(conn, party_id)?
        }
        PartyType::DeliveryBoy => {
            if crate::models::DeliveryAgent::find(conn, party_id)?.is_none() {
                return Err(SettlementError::PartyNotFound {
                    kind: "delivery agent",
                    id: party_id.to_string(),
                });
            }
            Commission::for_agent(conn, party_id)?
        }
    };

    let mut paid = Decimal::ZERO;
    let mut pending = Decimal::ZERO;
    for commission in &commissions {
        if commission.is_paid() {
            paid += money::dec(commission.commission_amount);
        } else if commission.is_pending() {
            pending += money::dec(commission.commission_amount);
        }
    }

    Ok(CommissionSummary {
        total: money::to_f64(paid + pending),
        paid: money::to_f64(paid),
        pending: money::to_f64(pending),
        commissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_in_memory;
    use crate::models::{
        DeliveryAgent, NewDeliveryAgent, NewOrder, NewOrderItem, NewProduct, NewSeller,
        OrderStatus, PaymentMethod, Product, Seller, WalletTransaction,
    };

    struct Fixture {
        order_id: String,
        seller_id: String,
        agent_id: String,
    }

    /// Prepaid order: subtotal 300 (one item), platform fee 10,
    /// shipping 30, seller rate 10%, agent rate 5%.
    fn prepaid_fixture(conn: &mut SqliteConnection) -> Fixture {
        let seller = Seller::create(conn, NewSeller::new("shop", Some(10.0))).unwrap();
        let agent = DeliveryAgent::create(conn, NewDeliveryAgent::new("rider", Some(5.0))).unwrap();
        let product = Product::create(conn, NewProduct::new(&seller.id, "lamp")).unwrap();
        let mut new_order = NewOrder::new(PaymentMethod::Prepaid, 300.0, 10.0, 30.0);
        new_order.delivery_agent_id = Some(agent.id.clone());
        let order = Order::create(conn, new_order).unwrap();
        OrderItem::create(conn, NewOrderItem::new(&order.id, &product.id, &seller.id, 1, 300.0))
            .unwrap();
        Fixture {
            order_id: order.id,
            seller_id: seller.id,
            agent_id: agent.id,
        }
    }

    #[test]
    fn prepaid_creation_pays_sellers_immediately() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);

        let result = create_order_commissions(&mut conn, &fx.order_id).unwrap();
        assert_eq!(result.created, 2);
        assert!(!result.already_existed);

        let commissions = Commission::for_order(&mut conn, &fx.order_id).unwrap();
        let seller_row = commissions.iter().find(|c| c.is_seller()).unwrap();
        assert!(seller_row.is_paid());
        assert!(seller_row.paid_at.is_some());
        let agent_row = commissions.iter().find(|c| c.is_delivery()).unwrap();
        assert!(agent_row.is_pending());

        let seller = Seller::find(&mut conn, &fx.seller_id).unwrap().unwrap();
        assert_eq!(seller.balance, 270.0);

        // Second call is a no-op: no duplicate rows, no double credit.
        let again = create_order_commissions(&mut conn, &fx.order_id).unwrap();
        assert!(again.already_existed);
        assert_eq!(Commission::for_order(&mut conn, &fx.order_id).unwrap().len(), 2);
        let seller = Seller::find(&mut conn, &fx.seller_id).unwrap().unwrap();
        assert_eq!(seller.balance, 270.0);
    }

    #[test]
    fn distribution_requires_delivered_order() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);
        assert!(matches!(
            distribute_commissions(&mut conn, &fx.order_id),
            Err(SettlementError::OrderNotDelivered(_))
        ));
    }

    #[test]
    fn prepaid_distribution_pays_agent_and_is_idempotent() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);
        create_order_commissions(&mut conn, &fx.order_id).unwrap();
        Order::set_status(&mut conn, &fx.order_id, OrderStatus::Delivered).unwrap();

        let result = distribute_commissions(&mut conn, &fx.order_id).unwrap();
        assert_eq!(result.distributed, 1);

        let agent = DeliveryAgent::find(&mut conn, &fx.agent_id).unwrap().unwrap();
        assert_eq!(agent.balance, 15.0);

        // Full admin earning recognized once create + distribute ran:
        // 30 product commission + 10 platform fee + 30 delivery share.
        let wallet = PlatformWallet::try_get(&mut conn).unwrap().unwrap();
        assert_eq!(wallet.total_admin_earning, 70.0);

        let again = distribute_commissions(&mut conn, &fx.order_id).unwrap();
        assert_eq!(again.distributed, 0);
        let wallet = PlatformWallet::try_get(&mut conn).unwrap().unwrap();
        assert_eq!(wallet.total_admin_earning, 70.0);
    }

    #[test]
    fn reversal_nets_wallet_transactions_to_zero() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);
        create_order_commissions(&mut conn, &fx.order_id).unwrap();
        Order::set_status(&mut conn, &fx.order_id, OrderStatus::Delivered).unwrap();
        distribute_commissions(&mut conn, &fx.order_id).unwrap();

        let result = reverse_commissions(&mut conn, &fx.order_id).unwrap();
        assert_eq!(result.reversed, 2);

        let txns = WalletTransaction::for_order(&mut conn, &fx.order_id).unwrap();
        let net: f64 = txns
            .iter()
            .map(|t| if t.txn_type == "CREDIT" { t.amount } else { -t.amount })
            .sum();
        assert_eq!(net, 0.0);

        let seller = Seller::find(&mut conn, &fx.seller_id).unwrap().unwrap();
        assert_eq!(seller.balance, 0.0);
        let agent = DeliveryAgent::find(&mut conn, &fx.agent_id).unwrap().unwrap();
        assert_eq!(agent.balance, 0.0);

        let wallet = PlatformWallet::try_get(&mut conn).unwrap().unwrap();
        assert_eq!(wallet.total_admin_earning, 0.0);

        for commission in Commission::for_order(&mut conn, &fx.order_id).unwrap() {
            assert_eq!(commission.status, "CANCELLED");
        }
    }

    #[test]
    fn reversing_an_untouched_order_is_a_noop_success() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);
        let result = reverse_commissions(&mut conn, &fx.order_id).unwrap();
        assert_eq!(result.reversed, 0);
        assert_eq!(result.message, "no commissions to reverse");
    }

    #[test]
    fn summary_splits_paid_and_pending() {
        let mut conn = establish_in_memory().unwrap();
        let fx = prepaid_fixture(&mut conn);
        create_order_commissions(&mut conn, &fx.order_id).unwrap();

        let summary = commission_summary(&mut conn, &fx.seller_id, PartyType::Seller).unwrap();
        assert_eq!(summary.paid, 30.0);
        assert_eq!(summary.pending, 0.0);
        assert_eq!(summary.total, 30.0);
        assert_eq!(summary.commissions.len(), 1);

        let summary =
            commission_summary(&mut conn, &fx.agent_id, PartyType::DeliveryBoy).unwrap();
        assert_eq!(summary.pending, 15.0);
        assert_eq!(summary.paid, 0.0);
    }

    #[test]
    fn summary_for_unknown_party_is_not_found() {
        let mut conn = establish_in_memory().unwrap();
        assert!(matches!(
            commission_summary(&mut conn, "ghost", PartyType::Seller),
            Err(SettlementError::PartyNotFound { .. })
        ));
    }
}
