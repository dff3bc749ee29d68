//! COD settlement endpoints: delivery processing, breakdown preview,
//! and agent remittance for the payout-verification flow.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::db::DbPool;
use crate::handlers::{bad_request, run_db};
use crate::services::{breakdown, cod_settlement};

/// POST /api/orders/{id}/cod/delivered
pub async fn delivered(pool: web::Data<DbPool>, path: web::Path<String>) -> HttpResponse {
    let order_id = path.into_inner();
    run_db(pool.get_ref().clone(), move |conn| {
        cod_settlement::process_cod_delivery(conn, &order_id)
    })
    .await
}

/// GET /api/orders/{id}/cod/breakdown
pub async fn cod_breakdown(pool: web::Data<DbPool>, path: web::Path<String>) -> HttpResponse {
    let order_id = path.into_inner();
    run_db(pool.get_ref().clone(), move |conn| {
        breakdown::compute_cod_breakdown(conn, &order_id)
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct RemitRequest {
    pub amount: f64,
}

/// POST /api/delivery-agents/{id}/remittances
pub async fn remit(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    payload: web::Json<RemitRequest>,
) -> HttpResponse {
    let agent_id = path.into_inner();
    let amount = payload.amount;
    if !amount.is_finite() || amount <= 0.0 {
        return bad_request("remittance amount must be a positive number");
    }
    run_db(pool.get_ref().clone(), move |conn| {
        cod_settlement::record_remittance(conn, &agent_id, amount)
    })
    .await
}
