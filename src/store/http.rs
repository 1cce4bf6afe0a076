//! REST client for the marketplace backend services.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::time::Duration;

use super::{StoreError, StoreResult, Storefront};
use crate::domain::aggregates::{
    Cart, CartItem, CartItemUpdate, Credentials, LoginResponse, NewCart, NewCartItem, NewOrder, NewOrderItem,
    NewShop, NewUser, Order, OrderItem, OrderStatus, Product, ProductDraft, Shop, ShopPatch, User,
};
use crate::domain::value_objects::{CartId, CartItemId, OrderId, ProductId, ShopId, UserId};

#[derive(Debug, Clone)]
pub struct HttpStorefront {
    client: Client,
    base_url: String,
}

impl HttpStorefront {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(transport)?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, resource: &'static str, id: impl Display) -> StoreResult<T> {
        let response = check(request.send().await.map_err(transport)?, resource, id).await?;
        response.json::<T>().await.map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn execute(&self, request: RequestBuilder, resource: &'static str, id: impl Display) -> StoreResult<()> {
        check(request.send().await.map_err(transport)?, resource, id).await.map(|_| ())
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    if e.is_decode() { StoreError::Decode(e.to_string()) } else { StoreError::Transport(e.to_string()) }
}

async fn check(response: reqwest::Response, resource: &'static str, id: impl Display) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(StoreError::not_found(resource, id)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT | StatusCode::UNAUTHORIZED => {
            Err(StoreError::Rejected(if message.is_empty() { status.to_string() } else { message }))
        }
        _ => Err(StoreError::Http { status: status.as_u16(), message }),
    }
}

#[async_trait]
impl Storefront for HttpStorefront {
    async fn products(&self) -> StoreResult<Vec<Product>> {
        self.fetch(self.client.get(self.url("/api/products")), "products", "*").await
    }

    async fn product(&self, id: ProductId) -> StoreResult<Product> {
        self.fetch(self.client.get(self.url(&format!("/api/products/{id}"))), "product", id).await
    }

    async fn products_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Product>> {
        self.fetch(self.client.get(self.url(&format!("/api/products/shop/{shop}"))), "shop", shop).await
    }

    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product> {
        self.fetch(self.client.post(self.url("/api/products")).json(&draft), "product", "new").await
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product> {
        self.fetch(self.client.put(self.url(&format!("/api/products/{id}"))).json(&draft), "product", id).await
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        self.execute(self.client.delete(self.url(&format!("/api/products/{id}"))), "product", id).await
    }

    async fn shops(&self) -> StoreResult<Vec<Shop>> {
        self.fetch(self.client.get(self.url("/api/shops")), "shops", "*").await
    }

    async fn shop(&self, id: ShopId) -> StoreResult<Shop> {
        self.fetch(self.client.get(self.url(&format!("/api/shops/{id}"))), "shop", id).await
    }

    async fn shops_by_owner(&self, owner: UserId) -> StoreResult<Vec<Shop>> {
        self.fetch(self.client.get(self.url(&format!("/api/shops/owner/{owner}"))), "owner", owner).await
    }

    async fn create_shop(&self, shop: NewShop) -> StoreResult<Shop> {
        self.fetch(self.client.post(self.url("/api/shops")).json(&shop), "shop", "new").await
    }

    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop> {
        self.fetch(self.client.put(self.url(&format!("/api/shops/{id}"))).json(&patch), "shop", id).await
    }

    async fn carts_by_user(&self, user: UserId) -> StoreResult<Vec<Cart>> {
        self.fetch(self.client.get(self.url(&format!("/api/carts/user/{user}"))), "user", user).await
    }

    async fn create_cart(&self, cart: NewCart) -> StoreResult<Cart> {
        self.fetch(self.client.post(self.url("/api/carts")).json(&cart), "cart", "new").await
    }

    async fn add_cart_item(&self, cart: CartId, item: NewCartItem) -> StoreResult<CartItem> {
        self.fetch(self.client.post(self.url(&format!("/api/carts/{cart}/items"))).json(&item), "cart", cart).await
    }

    async fn delete_cart(&self, cart: CartId) -> StoreResult<()> {
        self.execute(self.client.delete(self.url(&format!("/api/carts/{cart}"))), "cart", cart).await
    }

    async fn cart_items(&self, cart: CartId) -> StoreResult<Vec<CartItem>> {
        self.fetch(self.client.get(self.url(&format!("/api/carts/{cart}/items"))), "cart", cart).await
    }

    async fn update_cart_item(&self, id: CartItemId, update: CartItemUpdate) -> StoreResult<CartItem> {
        self.fetch(self.client.put(self.url(&format!("/api/cart-items/{id}"))).json(&update), "cart item", id).await
    }

    async fn remove_cart_item(&self, id: CartItemId) -> StoreResult<()> {
        self.execute(self.client.delete(self.url(&format!("/api/cart-items/{id}"))), "cart item", id).await
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        self.fetch(self.client.post(self.url("/api/orders")).json(&order), "order", "new").await
    }

    async fn order(&self, id: OrderId) -> StoreResult<Order> {
        self.fetch(self.client.get(self.url(&format!("/api/orders/{id}"))), "order", id).await
    }

    async fn orders_by_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        self.fetch(self.client.get(self.url(&format!("/api/orders/user/{user}"))), "user", user).await
    }

    async fn orders_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Order>> {
        self.fetch(self.client.get(self.url(&format!("/api/orders/shop/{shop}"))), "shop", shop).await
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        // The order service reads the raw request body as the new status.
        let request = self
            .client
            .put(self.url(&format!("/api/orders/{id}/status")))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(status.as_str());
        self.fetch(request, "order", id).await
    }

    async fn order_items(&self, order: OrderId) -> StoreResult<Vec<OrderItem>> {
        self.fetch(self.client.get(self.url(&format!("/api/order-items/order/{order}"))), "order", order).await
    }

    async fn create_order_item(&self, item: NewOrderItem) -> StoreResult<OrderItem> {
        let order = item.order_id;
        self.fetch(self.client.post(self.url("/api/order-items")).json(&item), "order", order).await
    }

    async fn user(&self, id: UserId) -> StoreResult<User> {
        self.fetch(self.client.get(self.url(&format!("/api/users/{id}"))), "user", id).await
    }

    async fn login(&self, credentials: Credentials) -> StoreResult<LoginResponse> {
        let email = credentials.email.clone();
        self.fetch(self.client.post(self.url("/api/users/login")).json(&credentials), "account", email).await
    }

    async fn register(&self, user: NewUser) -> StoreResult<User> {
        self.fetch(self.client.post(self.url("/api/users/register")).json(&user), "account", "new").await
    }
}
