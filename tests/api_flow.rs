//! HTTP surface tests: routing, the `{success, data|message}` envelope,
//! and status mapping, against a throwaway file-backed database.

use actix_web::{test, web, App};
use diesel::prelude::*;
use uuid::Uuid;

use settld::db::{self, DbPool};
use settld::handlers::{cod, commissions, dashboard};
use settld::models::{
    DeliveryAgent, NewDeliveryAgent, NewOrder, NewOrderItem, NewProduct, NewSeller, Order,
    OrderItem, OrderStatus, PaymentMethod, Product, Seller,
};

/// In-memory SQLite does not survive pooling, so the API tests run
/// against a real file that is removed on drop.
struct TestDb {
    path: std::path::PathBuf,
    pool: DbPool,
}

impl TestDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("settld-api-{}.db", Uuid::new_v4()));
        let pool = db::create_pool(path.to_str().unwrap()).unwrap();
        let mut conn = pool.get().unwrap();
        db::run_migrations(&mut conn).unwrap();
        Self { path, pool }
    }

    fn conn(&self) -> impl std::ops::DerefMut<Target = SqliteConnection> {
        self.pool.get().unwrap()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.as_os_str().to_owned();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }
}

macro_rules! test_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.pool.clone()))
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
                        .route("/delivery-agents/{id}/remittances", web::post().to(cod::remit))
                        .route(
                            "/parties/{party_type}/{id}/commission-summary",
                            web::get().to(commissions::summary),
                        )
                        .route(
                            "/admin/financial-dashboard",
                            web::get().to(dashboard::financial),
                        ),
                ),
        )
        .await
    };
}

struct Seeded {
    seller_id: String,
    agent_id: String,
    order_id: String,
}

fn seed_delivered_cod(db: &TestDb) -> Seeded {
    let mut conn = db.conn();
    let seller = Seller::create(&mut conn, NewSeller::new("shop", Some(10.0))).unwrap();
    let agent =
        DeliveryAgent::create(&mut conn, NewDeliveryAgent::new("rider", Some(5.0))).unwrap();
    let product = Product::create(&mut conn, NewProduct::new(&seller.id, "lamp")).unwrap();
    let mut new_order = NewOrder::new(PaymentMethod::Cod, 300.0, 10.0, 30.0);
    new_order.delivery_agent_id = Some(agent.id.clone());
    let order = Order::create(&mut conn, new_order).unwrap();
    OrderItem::create(
        &mut conn,
        NewOrderItem::new(&order.id, &product.id, &seller.id, 1, 300.0),
    )
    .unwrap();
    Order::set_status(&mut conn, &order.id, OrderStatus::Delivered).unwrap();
    Seeded {
        seller_id: seller.id,
        agent_id: agent.id,
        order_id: order.id,
    }
}

#[actix_web::test]
async fn unknown_order_maps_to_not_found_envelope() {
    let db = TestDb::new();
    let app = test_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/orders/no-such-order/commissions/distribute")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("no-such-order"));
}

#[actix_web::test]
async fn invalid_party_type_is_a_bad_request() {
    let db = TestDb::new();
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri("/api/parties/investor/abc/commission-summary")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn remittance_rejects_non_positive_amount() {
    let db = TestDb::new();
    let app = test_app!(db);

    let req = test::TestRequest::post()
        .uri("/api/delivery-agents/whoever/remittances")
        .set_json(serde_json::json!({ "amount": -5.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn cod_flow_over_http() {
    let db = TestDb::new();
    let seeded = seed_delivered_cod(&db);
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}/cod/breakdown", seeded.order_id))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["agent_commission"], 15.0);
    assert_eq!(body["data"]["amount_agent_owes_admin"], 325.0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/cod/delivered", seeded.order_id))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["already_processed"], false);

    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/delivery-agents/{}/remittances",
            seeded.agent_id
        ))
        .set_json(serde_json::json!({ "amount": 325.0 }))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["processed_count"], 1);
    assert_eq!(body["data"]["remaining_amount"], 0.0);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/parties/seller/{}/commission-summary",
            seeded.seller_id
        ))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["paid"], 30.0);
    assert_eq!(body["data"]["pending"], 0.0);

    let req = test::TestRequest::get()
        .uri("/api/admin/financial-dashboard")
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_admin_earning"], 70.0);
    assert_eq!(body["data"]["pending_from_delivery_boy"], 0.0);
    assert_eq!(body["data"]["seller_pending_payouts"], 270.0);
}
