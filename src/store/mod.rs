//! Data access to the marketplace backend
//!
//! [`Storefront`] is the only way the workflows reach persisted state. Every
//! call resolves to one typed result or fails; callers never retry.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{
    Cart, CartItem, CartItemUpdate, Credentials, LoginResponse, NewCart, NewCartItem, NewOrder, NewOrderItem,
    NewShop, NewUser, Order, OrderItem, OrderStatus, Product, ProductDraft, Shop, ShopPatch, User,
};
use crate::domain::value_objects::{CartId, CartItemId, OrderId, ProductId, ShopId, UserId};

pub mod http;
pub mod memory;

pub use http::HttpStorefront;
pub use memory::{MemoryStore, StoreOp};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound { resource, id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Storefront: Send + Sync {
    // Products
    async fn products(&self) -> StoreResult<Vec<Product>>;
    async fn product(&self, id: ProductId) -> StoreResult<Product>;
    async fn products_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Product>>;
    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product>;
    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    // Shops
    async fn shops(&self) -> StoreResult<Vec<Shop>>;
    async fn shop(&self, id: ShopId) -> StoreResult<Shop>;
    async fn shops_by_owner(&self, owner: UserId) -> StoreResult<Vec<Shop>>;
    async fn create_shop(&self, shop: NewShop) -> StoreResult<Shop>;
    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop>;

    // Carts
    async fn carts_by_user(&self, user: UserId) -> StoreResult<Vec<Cart>>;
    async fn create_cart(&self, cart: NewCart) -> StoreResult<Cart>;
    async fn add_cart_item(&self, cart: CartId, item: NewCartItem) -> StoreResult<CartItem>;
    async fn delete_cart(&self, cart: CartId) -> StoreResult<()>;

    // Cart items
    async fn cart_items(&self, cart: CartId) -> StoreResult<Vec<CartItem>>;
    async fn update_cart_item(&self, id: CartItemId, update: CartItemUpdate) -> StoreResult<CartItem>;
    async fn remove_cart_item(&self, id: CartItemId) -> StoreResult<()>;

    // Orders
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn order(&self, id: OrderId) -> StoreResult<Order>;
    async fn orders_by_user(&self, user: UserId) -> StoreResult<Vec<Order>>;
    async fn orders_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Order>>;
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order>;

    // Order items
    async fn order_items(&self, order: OrderId) -> StoreResult<Vec<OrderItem>>;
    async fn create_order_item(&self, item: NewOrderItem) -> StoreResult<OrderItem>;

    // Users
    async fn user(&self, id: UserId) -> StoreResult<User>;
    async fn login(&self, credentials: Credentials) -> StoreResult<LoginResponse>;
    async fn register(&self, user: NewUser) -> StoreResult<User>;
}
