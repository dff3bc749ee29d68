//! Breakdown calculator: the single place the monetary split for an
//! order is derived. Distribution, COD settlement and the dashboard
//! fallback all depend on this instead of re-deriving the
//! distance/percentage branch themselves.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;

use crate::error::{Result, SettlementError};
use crate::models::{Order, PaymentMethod, Settings};
use crate::money;
use crate::services::rate_resolver;

/// Per-item monetary line.
#[derive(Debug, Clone, Serialize)]
pub struct ItemLine {
    pub order_item_id: String,
    pub seller_id: String,
    pub line_total: f64,
    /// Percent applied to the line total.
    pub rate: f64,
    pub commission: f64,
    pub seller_earning: f64,
}

/// The full computed monetary split for one order. Pure data; all
/// values rounded to 2 decimal places.
#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    pub order_id: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<ItemLine>,
    /// Net earning per seller across the order's items.
    pub seller_earnings: BTreeMap<String, f64>,
    pub admin_product_commission: f64,
    pub platform_fee: f64,
    /// Percent of subtotal, or per-km rate on the distance path.
    pub agent_rate: f64,
    pub agent_commission: f64,
    pub distance_based: bool,
    pub admin_delivery_share: f64,
    pub total_admin_earning: f64,
    /// COD only: what the agent collected minus their own cut.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_agent_owes_admin: Option<f64>,
}

/// Compute the split for an order. Read-only and idempotent given
/// stable inputs; callable repeatedly.
pub fn compute_breakdown(conn: &mut SqliteConnection, order_id: &str) -> Result<Breakdown> {
    let order = Order::find(conn, order_id)?
        .ok_or_else(|| SettlementError::OrderNotFound(order_id.to_string()))?;
    let payment_method = order.payment_method().ok_or_else(|| {
        SettlementError::InvalidState(format!(
            "order {} has unknown payment method {}",
            order_id, order.payment_method
        ))
    })?;

    let items = Order::items(conn, order_id)?;
    let mut lines = Vec::with_capacity(items.len());
    let mut seller_earnings: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut admin_product_commission = Decimal::ZERO;

    for item in &items {
        // A previously pinned rate wins over re-resolution so repeated
        // settlement runs see identical numbers.
        let rate = match item.commission_rate.filter(|r| *r > 0.0) {
            Some(rate) => money::dec(rate),
            None => rate_resolver::resolve_product_rate(conn, &item.product_id, &item.seller_id),
        };
        let line_total = money::dec(item.total);
        let commission = money::round2(money::percent_of(line_total, rate));
        let earning = line_total - commission;

        admin_product_commission += commission;
        *seller_earnings.entry(item.seller_id.clone()).or_default() += earning;

        lines.push(ItemLine {
            order_item_id: item.id.clone(),
            seller_id: item.seller_id.clone(),
            line_total: money::to_f64(line_total),
            rate: money::to_f64(rate),
            commission: money::to_f64(commission),
            seller_earning: money::to_f64(earning),
        });
    }

    let subtotal = money::dec(order.subtotal);
    let platform_fee = money::dec(order.platform_fee);
    let shipping = money::dec(order.shipping_charge);
    let total = money::dec(order.total);

    let settings = Settings::try_get(conn).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "settings lookup failed, delivery split uses percentage fallback");
        None
    });

    let (agent_rate, agent_commission, distance_based, admin_delivery_share) =
        match order.delivery_agent_id.as_deref() {
            None => (Decimal::ZERO, Decimal::ZERO, false, shipping),
            Some(agent_id) => {
                let distance_cfg = settings
                    .as_ref()
                    .filter(|s| s.is_distance_based() && s.delivery_km_rate > 0.0);
                match (distance_cfg, order.delivery_distance_km) {
                    (Some(cfg), Some(km)) => {
                        let km_rate = money::dec(cfg.delivery_km_rate);
                        let commission = money::round2(money::dec(km) * km_rate);
                        let share = shipping - commission;
                        if share < Decimal::ZERO {
                            // Misconfiguration: per-km pay exceeds the
                            // delivery charge. Admin absorbs the
                            // negative share; not clamped.
                            error!(
                                order_id,
                                agent_commission = %commission,
                                shipping_charge = %shipping,
                                "distance-based agent pay exceeds delivery charge"
                            );
                        }
                        (km_rate, commission, true, share)
                    }
                    _ => {
                        // Percentage of subtotal rather than of the
                        // shipping fee, so the agent still earns when
                        // shipping is advertised as free.
                        let rate = rate_resolver::resolve_delivery_rate(conn, agent_id);
                        let commission = money::round2(money::percent_of(subtotal, rate));
                        (rate, commission, false, shipping)
                    }
                }
            }
        };

    let total_admin_earning = admin_product_commission + platform_fee + admin_delivery_share;
    let amount_agent_owes_admin = (payment_method == PaymentMethod::Cod)
        .then(|| money::to_f64(total - agent_commission));

    Ok(Breakdown {
        order_id: order_id.to_string(),
        payment_method,
        items: lines,
        seller_earnings: seller_earnings
            .into_iter()
            .map(|(seller, earning)| (seller, money::to_f64(earning)))
            .collect(),
        admin_product_commission: money::to_f64(admin_product_commission),
        platform_fee: money::to_f64(platform_fee),
        agent_rate: money::to_f64(agent_rate),
        agent_commission: money::to_f64(agent_commission),
        distance_based,
        admin_delivery_share: money::to_f64(admin_delivery_share),
        total_admin_earning: money::to_f64(total_admin_earning),
        amount_agent_owes_admin,
    })
}

/// COD-specific entry point used by the payout callers.
pub fn compute_cod_breakdown(conn: &mut SqliteConnection, order_id: &str) -> Result<Breakdown> {
    let breakdown = compute_breakdown(conn, order_id)?;
    if breakdown.payment_method != PaymentMethod::Cod {
        return Err(SettlementError::InvalidPaymentMethod {
            order_id: order_id.to_string(),
            method: breakdown.payment_method.as_str().to_string(),
            expected: PaymentMethod::Cod.as_str(),
        });
    }
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_in_memory;
    use diesel::prelude::*;
    use crate::models::{
        DeliveryAgent, NewDeliveryAgent, NewOrder, NewOrderItem, NewProduct, NewSeller, OrderItem,
        Product, Seller,
    };

    struct Fixture {
        order_id: String,
        agent_id: String,
    }

    /// The worked example: subtotal 300, platform fee 10, shipping 30,
    /// seller rate 10%, agent rate 5%, no distance tracking.
    fn cod_fixture(conn: &mut SqliteConnection) -> Fixture {
        let seller = Seller::create(conn, NewSeller::new("shop", Some(10.0))).unwrap();
        let agent = DeliveryAgent::create(conn, NewDeliveryAgent::new("rider", Some(5.0))).unwrap();
        let product = Product::create(conn, NewProduct::new(&seller.id, "lamp")).unwrap();
        let mut new_order = NewOrder::new(PaymentMethod::Cod, 300.0, 10.0, 30.0);
        new_order.delivery_agent_id = Some(agent.id.clone());
        // The order subsystem owns `total`; it can carry charges this
        // crate does not itemize.
        new_order.total = 360.0;
        let order = Order::create(conn, new_order).unwrap();
        OrderItem::create(conn, NewOrderItem::new(&order.id, &product.id, &seller.id, 1, 300.0))
            .unwrap();
        Fixture {
            order_id: order.id,
            agent_id: agent.id,
        }
    }

    #[test]
    fn worked_example_splits() {
        let mut conn = establish_in_memory().unwrap();
        let fx = cod_fixture(&mut conn);

        let bd = compute_breakdown(&mut conn, &fx.order_id).unwrap();
        assert_eq!(bd.admin_product_commission, 30.0);
        assert_eq!(bd.seller_earnings.values().sum::<f64>(), 270.0);
        assert_eq!(bd.agent_commission, 15.0);
        assert!(!bd.distance_based);
        assert_eq!(bd.admin_delivery_share, 30.0);
        assert_eq!(bd.total_admin_earning, 70.0);
        assert_eq!(bd.amount_agent_owes_admin, Some(345.0));
        let _ = fx.agent_id;
    }

    #[test]
    fn product_split_conserves_subtotal() {
        let mut conn = establish_in_memory().unwrap();
        let fx = cod_fixture(&mut conn);
        let bd = compute_breakdown(&mut conn, &fx.order_id).unwrap();
        let sellers: f64 = bd.seller_earnings.values().sum();
        assert_eq!(sellers + bd.admin_product_commission, 300.0);
    }

    #[test]
    fn distance_based_split_conserves_shipping() {
        let mut conn = establish_in_memory().unwrap();
        let fx = cod_fixture(&mut conn);
        Settings::get_or_create(&mut conn).unwrap();
        Settings::set_distance_based(&mut conn, true, 4.0).unwrap();
        diesel::update(crate::schema::orders::table.find(&fx.order_id))
            .set(crate::schema::orders::delivery_distance_km.eq(Some(5.0)))
            .execute(&mut conn)
            .unwrap();

        let bd = compute_breakdown(&mut conn, &fx.order_id).unwrap();
        assert!(bd.distance_based);
        assert_eq!(bd.agent_commission, 20.0);
        assert_eq!(bd.admin_delivery_share, 10.0);
        assert_eq!(bd.agent_commission + bd.admin_delivery_share, 30.0);
    }

    #[test]
    fn negative_delivery_share_is_not_clamped() {
        let mut conn = establish_in_memory().unwrap();
        let fx = cod_fixture(&mut conn);
        Settings::get_or_create(&mut conn).unwrap();
        Settings::set_distance_based(&mut conn, true, 10.0).unwrap();
        diesel::update(crate::schema::orders::table.find(&fx.order_id))
            .set(crate::schema::orders::delivery_distance_km.eq(Some(5.0)))
            .execute(&mut conn)
            .unwrap();

        let bd = compute_breakdown(&mut conn, &fx.order_id).unwrap();
        assert_eq!(bd.agent_commission, 50.0);
        assert_eq!(bd.admin_delivery_share, -20.0);
    }

    #[test]
    fn missing_order_is_not_found() {
        let mut conn = establish_in_memory().unwrap();
        assert!(matches!(
            compute_breakdown(&mut conn, "missing"),
            Err(SettlementError::OrderNotFound(_))
        ));
    }

    #[test]
    fn cod_entry_point_rejects_prepaid() {
        let mut conn = establish_in_memory().unwrap();
        let seller = Seller::create(&mut conn, NewSeller::new("shop", None)).unwrap();
        let product = Product::create(&mut conn, NewProduct::new(&seller.id, "lamp")).unwrap();
        let order =
            Order::create(&mut conn, NewOrder::new(PaymentMethod::Prepaid, 100.0, 5.0, 10.0))
                .unwrap();
        OrderItem::create(
            &mut conn,
            NewOrderItem::new(&order.id, &product.id, &seller.id, 1, 100.0),
        )
        .unwrap();

        assert!(matches!(
            compute_cod_breakdown(&mut conn, &order.id),
            Err(SettlementError::InvalidPaymentMethod { .. })
        ));
    }
}
