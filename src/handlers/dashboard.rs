//! Admin financial dashboard endpoint.

use actix_web::{web, HttpResponse};

use crate::db::DbPool;
use crate::handlers::run_db;
use crate::services::dashboard;

/// GET /api/admin/financial-dashboard
pub async fn financial(pool: web::Data<DbPool>) -> HttpResponse {
    run_db(pool.get_ref().clone(), dashboard::financial_dashboard).await
}
