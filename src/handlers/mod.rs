//! HTTP adapters. Thin by design: parse the path/body, hop onto a
//! blocking thread for diesel work, wrap the service result in the
//! standard `{success, data|message}` envelope.

pub mod cod;
pub mod commissions;
pub mod dashboard;

use actix_web::HttpResponse;
use diesel::SqliteConnection;
use serde::Serialize;
use tracing::error;

use crate::db::DbPool;
use crate::error::SettlementError;

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "message": message.into(),
    }))
}

/// Run a blocking ledger operation against a pooled connection and
/// translate the outcome into the JSON envelope.
pub(crate) async fn run_db<T, F>(pool: DbPool, op: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, SettlementError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| SettlementError::Pool(e.to_string()))?;
        op(&mut conn)
    })
    .await;

    match outcome {
        Ok(Ok(data)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": data,
        })),
        Ok(Err(err)) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, "settlement operation failed");
            }
            HttpResponse::build(status).json(serde_json::json!({
                "success": false,
                "message": err.to_string(),
            }))
        }
        Err(join_err) => {
            error!(error = %join_err, "settlement task panicked");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": "internal task failure",
            }))
        }
    }
}
