//! Commission rate resolution.
//!
//! Product-level resolution cascades most-specific first:
//! sub-sub-category, sub-category, category, seller override, global
//! default. An override only counts when it is positive. None of these
//! functions can fail: a commission calculation must never abort an
//! order-delivery transition, so lookup failures log a warning and
//! resolve to the safe default.

use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::warn;

use crate::config;
use crate::models::{Category, DeliveryAgent, Product, Seller, Settings};
use crate::money;

fn positive(rate: Option<f64>) -> Option<Decimal> {
    rate.filter(|r| *r > 0.0).map(money::dec)
}

fn global_seller_default(conn: &mut SqliteConnection) -> Decimal {
    match Settings::try_get(conn) {
        Ok(Some(settings)) if settings.default_seller_commission > 0.0 => {
            money::dec(settings.default_seller_commission)
        }
        Ok(_) => money::dec(config::seller_commission_default()),
        Err(e) => {
            warn!(error = %e, "settings lookup failed, using hardcoded seller default");
            money::dec(config::seller_commission_default())
        }
    }
}

fn global_delivery_default(conn: &mut SqliteConnection) -> Decimal {
    match Settings::try_get(conn) {
        Ok(Some(settings)) if settings.default_delivery_commission > 0.0 => {
            money::dec(settings.default_delivery_commission)
        }
        Ok(_) => money::dec(config::delivery_commission_default()),
        Err(e) => {
            warn!(error = %e, "settings lookup failed, using hardcoded delivery default");
            money::dec(config::delivery_commission_default())
        }
    }
}

/// Seller-level rate: individual override, else global default.
pub fn resolve_seller_rate(conn: &mut SqliteConnection, seller_id: &str) -> Decimal {
    match Seller::find(conn, seller_id) {
        Ok(Some(seller)) => {
            if let Some(rate) = positive(seller.commission_rate) {
                return rate;
            }
        }
        Ok(None) => warn!(seller_id, "seller missing during rate resolution, using default"),
        Err(e) => warn!(seller_id, error = %e, "seller lookup failed, using default rate"),
    }
    global_seller_default(conn)
}

/// Delivery-agent rate (percent of order subtotal): individual
/// override, else global default.
pub fn resolve_delivery_rate(conn: &mut SqliteConnection, agent_id: &str) -> Decimal {
    match DeliveryAgent::find(conn, agent_id) {
        Ok(Some(agent)) => {
            if let Some(rate) = positive(agent.commission_rate) {
                return rate;
            }
        }
        Ok(None) => warn!(agent_id, "delivery agent missing during rate resolution, using default"),
        Err(e) => warn!(agent_id, error = %e, "delivery agent lookup failed, using default rate"),
    }
    global_delivery_default(conn)
}

/// Product-level rate through the category cascade, falling through to
/// the seller-level resolution.
pub fn resolve_product_rate(
    conn: &mut SqliteConnection,
    product_id: &str,
    seller_id: &str,
) -> Decimal {
    let product = match Product::find(conn, product_id) {
        Ok(Some(product)) => Some(product),
        Ok(None) => {
            warn!(product_id, "product missing during rate resolution");
            None
        }
        Err(e) => {
            warn!(product_id, error = %e, "product lookup failed during rate resolution");
            None
        }
    };

    if let Some(product) = product {
        let cascade = [
            product.sub_sub_category_id.as_deref(),
            product.sub_category_id.as_deref(),
            product.category_id.as_deref(),
        ];
        for category_id in cascade.into_iter().flatten() {
            match Category::find(conn, category_id) {
                Ok(Some(category)) => {
                    if let Some(rate) = positive(category.commission_rate) {
                        return rate;
                    }
                }
                Ok(None) => warn!(category_id, "category missing during rate resolution"),
                Err(e) => warn!(category_id, error = %e, "category lookup failed"),
            }
        }
    }

    resolve_seller_rate(conn, seller_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::establish_in_memory;
    use crate::models::{NewCategory, NewDeliveryAgent, NewProduct, NewSeller};
    use rust_decimal_macros::dec as d;

    fn product_with_chain(
        conn: &mut SqliteConnection,
        seller_rate: Option<f64>,
        cat: Option<f64>,
        sub: Option<f64>,
        subsub: Option<f64>,
    ) -> (String, String, Vec<String>) {
        let seller = Seller::create(conn, NewSeller::new("shop", seller_rate)).unwrap();
        let c1 = Category::create(conn, NewCategory::new("electronics", cat)).unwrap();
        let c2 = Category::create(conn, NewCategory::new("phones", sub)).unwrap();
        let c3 = Category::create(conn, NewCategory::new("android", subsub)).unwrap();
        let mut new = NewProduct::new(&seller.id, "handset");
        new.category_id = Some(c1.id.clone());
        new.sub_category_id = Some(c2.id.clone());
        new.sub_sub_category_id = Some(c3.id.clone());
        let product = Product::create(conn, new).unwrap();
        (product.id, seller.id, vec![c1.id, c2.id, c3.id])
    }

    #[test]
    fn cascade_prefers_most_specific() {
        let mut conn = establish_in_memory().unwrap();
        let (product, seller, cats) =
            product_with_chain(&mut conn, Some(4.0), Some(6.0), Some(7.0), Some(8.0));

        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(8));

        Category::set_rate(&mut conn, &cats[2], None).unwrap();
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(7));

        Category::set_rate(&mut conn, &cats[1], None).unwrap();
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(6));

        Category::set_rate(&mut conn, &cats[0], None).unwrap();
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(4));
    }

    #[test]
    fn falls_through_to_global_default() {
        let mut conn = establish_in_memory().unwrap();
        let (product, seller, _) = product_with_chain(&mut conn, None, None, None, None);
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(10));
    }

    #[test]
    fn zero_override_is_not_an_override() {
        let mut conn = establish_in_memory().unwrap();
        let (product, seller, _) = product_with_chain(&mut conn, Some(0.0), Some(0.0), None, None);
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(10));
    }

    #[test]
    fn settings_row_overrides_hardcoded_default() {
        let mut conn = establish_in_memory().unwrap();
        Settings::get_or_create(&mut conn).unwrap();
        Settings::set_defaults(&mut conn, 12.0, 6.0).unwrap();
        let (product, seller, _) = product_with_chain(&mut conn, None, None, None, None);
        assert_eq!(resolve_product_rate(&mut conn, &product, &seller), d!(12));

        let agent = DeliveryAgent::create(&mut conn, NewDeliveryAgent::new("rider", None)).unwrap();
        assert_eq!(resolve_delivery_rate(&mut conn, &agent.id), d!(6));
    }

    #[test]
    fn missing_party_resolves_to_default() {
        let mut conn = establish_in_memory().unwrap();
        assert_eq!(resolve_seller_rate(&mut conn, "ghost"), d!(10));
        assert_eq!(resolve_delivery_rate(&mut conn, "ghost"), d!(5));
    }
}
