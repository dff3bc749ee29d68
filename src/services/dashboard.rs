//! Financial dashboard read path.
//!
//! Fast path reads the platform wallet singleton. If the aggregate has
//! never been created (bootstrap, pre-first-settlement), every figure
//! is recomputed from raw commission/order/withdraw-request rows using
//! the same formulas the aggregate accrues with. The fallback never
//! persists its result.

use diesel::SqliteConnection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Commission, DeliveryAgent, Order, PlatformWallet, Seller, WithdrawRequest};
use crate::money;
use crate::services::breakdown;

#[derive(Debug, Clone, Serialize)]
pub struct FinancialDashboard {
    pub total_platform_earning: f64,
    pub current_platform_balance: f64,
    pub total_admin_earning: f64,
    pub pending_from_delivery_boy: f64,
    pub seller_pending_payouts: f64,
    pub delivery_boy_pending_payouts: f64,
    /// False when the figures came from the bootstrap recompute.
    pub from_aggregate: bool,
}

pub fn financial_dashboard(conn: &mut SqliteConnection) -> Result<FinancialDashboard> {
    if let Some(wallet) = PlatformWallet::try_get(conn)? {
        return Ok(FinancialDashboard {
            total_platform_earning: wallet.total_platform_earning,
            current_platform_balance: wallet.current_platform_balance,
            total_admin_earning: wallet.total_admin_earning,
            pending_from_delivery_boy: wallet.pending_from_delivery_boy,
            seller_pending_payouts: wallet.seller_pending_payouts,
            delivery_boy_pending_payouts: wallet.delivery_boy_pending_payouts,
            from_aggregate: true,
        });
    }

    let mut earning = Decimal::ZERO;
    let mut pending_cod = Decimal::ZERO;

    for order in Order::delivered(conn)? {
        let commissions = Commission::for_order(conn, &order.id)?;
        if commissions.is_empty() {
            continue;
        }
        let bd = breakdown::compute_breakdown(conn, &order.id)?;
        let sellers_paid = commissions.iter().any(|c| c.is_seller() && c.is_paid());
        let sellers_pending = commissions.iter().any(|c| c.is_seller() && c.is_pending());
        let agent_paid = commissions.iter().any(|c| c.is_delivery() && c.is_paid());

        if order.is_cod() {
            if sellers_paid && !sellers_pending {
                earning += money::dec(bd.total_admin_earning);
            }
            if sellers_pending && agent_paid {
                pending_cod += money::dec(order.total) - money::dec(bd.agent_commission);
            }
        } else {
            if sellers_paid {
                earning +=
                    money::dec(bd.admin_product_commission) + money::dec(bd.platform_fee);
                if order.delivery_agent_id.is_none() {
                    earning += money::dec(bd.admin_delivery_share);
                }
            }
            if agent_paid {
                earning += money::dec(bd.admin_delivery_share);
            }
        }
    }

    // Processed withdraw requests are cash that already left the
    // platform's till; the withdrawal controller decrements the
    // aggregate when it exists.
    let withdrawals = money::dec(WithdrawRequest::sum_paid(conn)?);
    let earning_f = money::to_f64(earning);

    Ok(FinancialDashboard {
        total_platform_earning: earning_f,
        current_platform_balance: money::to_f64(earning - withdrawals),
        total_admin_earning: earning_f,
        pending_from_delivery_boy: money::to_f64(pending_cod),
        seller_pending_payouts: Seller::sum_balances(conn)?,
        delivery_boy_pending_payouts: DeliveryAgent::sum_balances(conn)?,
        from_aggregate: false,
    })
}
