//! Aggregates module
pub mod product;
pub mod shop;
pub mod order;
pub mod cart;
pub mod user;

pub use product::{Product, ProductDraft};
pub use shop::{NewShop, Shop, ShopPatch};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, UnknownStatus};
pub use cart::{Cart, CartItem, CartItemUpdate, NewCart, NewCartItem};
pub use user::{Credentials, LoginResponse, NewUser, User};
