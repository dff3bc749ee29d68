//! Commission ledger endpoints for the order-lifecycle caller.

use actix_web::{web, HttpResponse};

use crate::db::DbPool;
use crate::handlers::{bad_request, run_db};
use crate::models::PartyType;
use crate::services::commission_ledger;

/// POST /api/orders/{id}/commissions
pub async fn create(pool: web::Data<DbPool>, path: web::Path<String>) -> HttpResponse {
    let order_id = path.into_inner();
    run_db(pool.get_ref().clone(), move |conn| {
        commission_ledger::create_order_commissions(conn, &order_id)
    })
    .await
}

/// POST /api/orders/{id}/commissions/distribute
pub async fn distribute(pool: web::Data<DbPool>, path: web::Path<String>) -> HttpResponse {
    let order_id = path.into_inner();
    run_db(pool.get_ref().clone(), move |conn| {
        commission_ledger::distribute_commissions(conn, &order_id)
    })
    .await
}

/// POST /api/orders/{id}/commissions/reverse
pub async fn reverse(pool: web::Data<DbPool>, path: web::Path<String>) -> HttpResponse {
    let order_id = path.into_inner();
    run_db(pool.get_ref().clone(), move |conn| {
        commission_ledger::reverse_commissions(conn, &order_id)
    })
    .await
}

/// GET /api/parties/{party_type}/{id}/commission-summary
pub async fn summary(pool: web::Data<DbPool>, path: web::Path<(String, String)>) -> HttpResponse {
    let (party_type_raw, party_id) = path.into_inner();
    let Some(party_type) = PartyType::parse(&party_type_raw.to_uppercase()) else {
        return bad_request(format!(
            "unknown party type '{party_type_raw}', expected SELLER or DELIVERY_BOY"
        ));
    };
    run_db(pool.get_ref().clone(), move |conn| {
        commission_ledger::commission_summary(conn, &party_id, party_type)
    })
    .await
}
