use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use settld::db;
use settld::handlers::{cod, commissions, dashboard};

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "settld.db".to_string());
    let pool = db::create_pool(&database_url)?;
    {
        let mut conn = pool
            .get()
            .context("Failed to get connection for migrations")?;
        db::run_migrations(&mut conn)?;
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    info!(%host, port, %database_url, "starting settlement server");

    let data = web::Data::new(pool);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .route("/orders/{id}/commissions", web::post().to(commissions::create))
                    .route(
                        "/orders/{id}/commissions/distribute",
                        web::post().to(commissions::distribute),
                    )
                    .route(
                        "/orders/{id}/commissions/reverse",
                        web::post().to(commissions::reverse),
                    )
                    .route("/orders/{id}/cod/delivered", web::post().to(cod::delivered))
                    .route("/orders/{id}/cod/breakdown", web::get().to(cod::cod_breakdown))
                    .route(
                        "/delivery-agents/{id}/remittances",
                        web::post().to(cod::remit),
                    )
                    .route(
                        "/parties/{party_type}/{id}/commission-summary",
                        web::get().to(commissions::summary),
                    )
                    .route(
                        "/admin/financial-dashboard",
                        web::get().to(dashboard::financial),
                    ),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
