//! HTTP surface of the storefront.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::{Credentials, NewShop, NewUser, OrderStatus, Product, ProductDraft, Shop, User};
use crate::domain::value_objects::{CartItemId, OrderId, ProductId, Quantity, ShopId};
use crate::session::{Session, SessionState};
use crate::workflow::{
    CartSnapshot, CheckoutReceipt, CheckoutRequest, CustomerOrder, Marketplace, ProductDetail, ReceivedOrders,
    ShopDetail, StatusChange, VendorCatalog,
};
use crate::StorefrontError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub marketplace: Marketplace,
    pub session: Arc<Session>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "shopsquare-storefront"})) }))
        .route("/api/v1/session", get(current_session))
        .route("/api/v1/session/login", post(login))
        .route("/api/v1/session/logout", post(logout))
        .route("/api/v1/session/register", post(register))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(product_detail))
        .route("/api/v1/shops", get(list_shops))
        .route("/api/v1/shops/:id", get(shop_detail))
        .route("/api/v1/cart", get(get_cart))
        .route("/api/v1/cart/items", post(add_to_cart))
        .route("/api/v1/cart/items/:id", put(update_quantity).delete(remove_item))
        .route("/api/v1/checkout", post(checkout))
        .route("/api/v1/orders", get(customer_orders))
        .route("/api/v1/seller/orders", get(received_orders))
        .route("/api/v1/seller/orders/:id/status", put(advance_status))
        .route("/api/v1/seller/shop", get(seller_shop).post(create_shop))
        .route("/api/v1/seller/products", get(seller_shop).post(create_product))
        .route("/api/v1/seller/products/:id", put(update_product).delete(delete_product))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A workflow failure rendered as `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError(StorefrontError);

impl From<StorefrontError> for ApiError {
    fn from(e: StorefrontError) -> Self { Self(e) }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            StorefrontError::NotFound { .. } => StatusCode::NOT_FOUND,
            StorefrontError::Validation(_) | StorefrontError::EmptyCart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StorefrontError::InvalidTransition { .. } => StatusCode::CONFLICT,
            StorefrontError::Fetch { .. } | StorefrontError::Write { .. } => StatusCode::BAD_GATEWAY,
            StorefrontError::Unauthenticated => StatusCode::UNAUTHORIZED,
            StorefrontError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.user_message() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 { 1 }

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

/// Target status as sent by the client; parsed case-insensitively.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

impl StatusRequest {
    fn target(&self) -> Result<OrderStatus, StorefrontError> {
        self.status.parse::<OrderStatus>().map_err(|e| StorefrontError::Validation(e.to_string()))
    }
}

/// Session id from `Authorization: Bearer <id>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The user behind the request's bearer token.
pub struct SignedIn(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(state.session.user(bearer_token(&parts.headers)).await?))
    }
}

async fn current_session(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<Json<SessionState>> {
    s.session.current(bearer_token(&headers)).await.map(Json).ok_or_else(|| StorefrontError::Unauthenticated.into())
}

async fn login(State(s): State<AppState>, Json(r): Json<Credentials>) -> ApiResult<Json<SessionState>> {
    Ok(Json(s.marketplace.login(&s.session, r).await?))
}

async fn logout(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers).ok_or(StorefrontError::Unauthenticated)?;
    s.marketplace.logout(&s.session, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register(State(s): State<AppState>, Json(r): Json<NewUser>) -> ApiResult<(StatusCode, Json<User>)> {
    Ok((StatusCode::CREATED, Json(s.marketplace.register(r).await?)))
}

async fn list_products(State(s): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(s.marketplace.list_products().await?))
}

async fn product_detail(State(s): State<AppState>, Path(id): Path<ProductId>) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(s.marketplace.product_detail(id).await?))
}

async fn list_shops(State(s): State<AppState>) -> ApiResult<Json<Vec<Shop>>> {
    Ok(Json(s.marketplace.list_shops().await?))
}

async fn shop_detail(State(s): State<AppState>, Path(id): Path<ShopId>) -> ApiResult<Json<ShopDetail>> {
    Ok(Json(s.marketplace.shop_detail(id).await?))
}

async fn get_cart(State(s): State<AppState>, SignedIn(user): SignedIn) -> ApiResult<Json<CartSnapshot>> {
    Ok(Json(s.marketplace.load_carts(user.id).await?))
}

async fn add_to_cart(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Json(r): Json<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartSnapshot>)> {
    let quantity = Quantity::new(r.quantity).map_err(|e| StorefrontError::Validation(e.to_string()))?;
    s.marketplace.add_to_cart(user.id, r.product_id, quantity).await?;
    Ok((StatusCode::CREATED, Json(s.marketplace.load_carts(user.id).await?)))
}

async fn update_quantity(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Path(id): Path<CartItemId>,
    Json(r): Json<QuantityRequest>,
) -> ApiResult<Json<CartSnapshot>> {
    Ok(Json(s.marketplace.update_quantity(user.id, id, r.quantity).await?))
}

async fn remove_item(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Path(id): Path<CartItemId>,
) -> ApiResult<Json<CartSnapshot>> {
    Ok(Json(s.marketplace.remove_item(user.id, id).await?))
}

async fn checkout(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Json(r): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutReceipt>)> {
    Ok((StatusCode::CREATED, Json(s.marketplace.checkout(user.id, r).await?)))
}

async fn customer_orders(State(s): State<AppState>, SignedIn(user): SignedIn) -> ApiResult<Json<Vec<CustomerOrder>>> {
    Ok(Json(s.marketplace.load_customer_orders(user.id).await?))
}

async fn received_orders(State(s): State<AppState>, SignedIn(user): SignedIn) -> ApiResult<Json<ReceivedOrders>> {
    Ok(Json(s.marketplace.load_received_orders(user.id).await?))
}

async fn advance_status(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Path(id): Path<OrderId>,
    Json(r): Json<StatusRequest>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(s.marketplace.advance_status(user.id, id, r.target()?).await?))
}

async fn seller_shop(State(s): State<AppState>, SignedIn(user): SignedIn) -> ApiResult<Json<VendorCatalog>> {
    Ok(Json(s.marketplace.seller_shop(user.id).await?))
}

async fn create_shop(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Json(r): Json<NewShop>,
) -> ApiResult<(StatusCode, Json<VendorCatalog>)> {
    Ok((StatusCode::CREATED, Json(s.marketplace.create_shop(user.id, r).await?)))
}

async fn create_product(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Json(r): Json<ProductDraft>,
) -> ApiResult<(StatusCode, Json<VendorCatalog>)> {
    Ok((StatusCode::CREATED, Json(s.marketplace.save_product(user.id, None, r).await?)))
}

async fn update_product(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Path(id): Path<ProductId>,
    Json(r): Json<ProductDraft>,
) -> ApiResult<Json<VendorCatalog>> {
    Ok(Json(s.marketplace.save_product(user.id, Some(id), r).await?))
}

async fn delete_product(
    State(s): State<AppState>,
    SignedIn(user): SignedIn,
    Path(id): Path<ProductId>,
) -> ApiResult<Json<VendorCatalog>> {
    Ok(Json(s.marketplace.delete_product(user.id, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e| ApiError(e).status();
        assert_eq!(status(StorefrontError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status(StorefrontError::Validation("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(StorefrontError::InvalidTransition {
                order_id: OrderId(1),
                from: OrderStatus::Delivered,
                to: OrderStatus::Confirmed,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(StorefrontError::NotFound { resource: "shop", id: "3".into() }), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_request_accepts_any_case() {
        let r: StatusRequest = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(r.target().unwrap(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_unknown_target_status_is_invalid() {
        let r = StatusRequest { status: "RETURNED".into() };
        assert!(matches!(r.target(), Err(StorefrontError::Validation(_))));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer  ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer 4f2a".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("4f2a"));
    }
}
