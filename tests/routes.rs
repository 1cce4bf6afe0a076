use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use shopsquare_storefront::domain::events::MemorySink;
use shopsquare_storefront::routes::{router, AppState};
use shopsquare_storefront::session::Session;
use shopsquare_storefront::store::MemoryStore;
use shopsquare_storefront::{Marketplace, Product, Shop, Storefront};

struct App {
    router: Router,
    store: Arc<MemoryStore>,
    shop: Shop,
    mug: Product,
    plate: Product,
}

async fn app() -> App {
    let store = Arc::new(MemoryStore::new());
    store.seed_user("Asha", "asha@example.com", "pw").await;
    let seller = store.seed_user("Ravi", "ravi@example.com", "pw").await;
    let shop = store.seed_shop(seller.id, "Clay Corner", false).await;
    let mug = store.seed_product(shop.id, "Mug", Decimal::new(10, 0), 10).await;
    let plate = store.seed_product(shop.id, "Plate", Decimal::new(5, 0), 10).await;
    let marketplace = Marketplace::new(store.clone(), Arc::new(MemorySink::new()));
    let router = router(AppState { marketplace, session: Arc::new(Session::ephemeral()) });
    App { router, store, shop, mug, plate }
}

async fn send(router: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn sign_in(router: &Router, email: &str) -> String {
    let (status, body) =
        send(router, "POST", "/api/v1/session/login", None, Some(json!({"email": email, "password": "pw"}))).await;
    assert_eq!(status, StatusCode::OK);
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health() {
    let app = app().await;
    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn cart_requires_sign_in() {
    let app = app().await;
    let (status, body) = send(&app.router, "GET", "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please login to continue");
}

#[tokio::test]
async fn bad_password_is_unprocessable() {
    let app = app().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/v1/session/login",
        None,
        Some(json!({"email": "asha@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn sign_in_does_not_leak_to_other_clients() {
    let app = app().await;
    let asha = sign_in(&app.router, "asha@example.com").await;

    let (status, _) = send(&app.router, "GET", "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app.router, "GET", "/api/v1/session", Some("not-a-session"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = send(&app.router, "GET", "/api/v1/session", Some(&asha), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["email"], "asha@example.com");
}

#[tokio::test]
async fn checkout_then_seller_confirms() {
    let app = app().await;
    let asha = sign_in(&app.router, "asha@example.com").await;
    let asha = Some(asha.as_str());

    send(&app.router, "POST", "/api/v1/cart/items", asha, Some(json!({"productId": app.mug.id, "quantity": 2}))).await;
    let (status, cart) =
        send(&app.router, "POST", "/api/v1/cart/items", asha, Some(json!({"productId": app.plate.id, "quantity": 1})))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["summary"]["total"], 126.0);
    let cart_id = cart["carts"][0]["cart"]["id"].clone();

    let (status, receipt) = send(
        &app.router,
        "POST",
        "/api/v1/checkout",
        asha,
        Some(json!({"cartId": cart_id, "shippingAddress": "12 MG Road", "paymentMethod": "cod"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["order"]["status"], "PENDING");
    assert_eq!(receipt["items"].as_array().unwrap().len(), 2);
    let order_id = receipt["order"]["id"].as_i64().unwrap();

    let (_, orders) = send(&app.router, "GET", "/api/v1/orders", asha, None).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, "POST", "/api/v1/session/logout", asha, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, "GET", "/api/v1/orders", asha, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ravi = sign_in(&app.router, "ravi@example.com").await;
    let ravi = Some(ravi.as_str());
    let uri = format!("/api/v1/seller/orders/{order_id}/status");

    let (status, _) = send(&app.router, "PUT", &uri, ravi, Some(json!({"status": "RETURNED"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, change) = send(&app.router, "PUT", &uri, ravi, Some(json!({"status": "CONFIRMED"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(change["shopActivated"], true);
    assert_eq!(change["received"]["orders"][0]["vendorNumber"], 1);
    assert!(app.store.shop(app.shop.id).await.unwrap().is_active);

    let (status, body) = send(&app.router, "PUT", &uri, ravi, Some(json!({"status": "CANCELLED"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "An order that is CONFIRMED cannot be marked CANCELLED.");
}

#[tokio::test]
async fn checkout_with_blank_address_is_rejected() {
    let app = app().await;
    let asha = sign_in(&app.router, "asha@example.com").await;
    let asha = Some(asha.as_str());
    let (_, cart) = send(&app.router, "POST", "/api/v1/cart/items", asha, Some(json!({"productId": app.mug.id}))).await;
    let cart_id = cart["carts"][0]["cart"]["id"].clone();

    let (status, _) =
        send(&app.router, "POST", "/api/v1/checkout", asha, Some(json!({"cartId": cart_id, "shippingAddress": ""})))
            .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.store.all_orders().await.is_empty());
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = app().await;
    let (status, body) = send(&app.router, "GET", "/api/v1/products/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}
