//! ShopSquare Storefront
//!
//! Customer and seller storefront for a multi-vendor marketplace.
//!
//! ## Features
//! - Cart pricing (subtotal, flat 8% tax, threshold shipping)
//! - Checkout: cart to order, order lines with frozen prices
//! - Seller fulfilment: status progression, dormant shop activation
//! - Seller view of multi-vendor orders
//! - Vendor shop and product management
//!
//! Persistence belongs to the marketplace backend, reached through
//! [`store::Storefront`]. Every mutation is followed by a reload of the
//! affected collection; nothing is patched locally.

use thiserror::Error;

pub mod domain;
pub mod pricing;
pub mod catalog;
pub mod store;
pub mod workflow;
pub mod session;
pub mod config;
pub mod routes;

pub use domain::aggregates::{Cart, CartItem, Order, OrderItem, OrderStatus, Product, Shop, User};
pub use domain::value_objects::{format_inr, Money, Quantity};
pub use pricing::{compute_totals, CartTotals, ProductMap};
pub use store::{StoreError, Storefront};
pub use workflow::Marketplace;

use domain::value_objects::{CartId, OrderId};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("failed to load {what}: {source}")]
    Fetch { what: &'static str, #[source] source: StoreError },

    #[error("failed to {action}: {source}")]
    Write { action: &'static str, #[source] source: StoreError },

    #[error("{0}")]
    Validation(String),

    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatus, to: OrderStatus },

    #[error("cart {0} has no items that can be ordered")]
    EmptyCart(CartId),

    #[error("sign in required")]
    Unauthenticated,

    #[error("session storage error: {0}")]
    Session(String),
}

impl StorefrontError {
    /// Converts a failed read; a backend not-found stays a not-found.
    pub fn fetch(what: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            source => Self::Fetch { what, source },
        }
    }

    pub fn write(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Write { action, source }
    }

    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, .. } => format!("{} not found", capitalize(resource)),
            Self::Fetch { what, .. } => format!("Could not load {what}. Please try again."),
            Self::Write { action, .. } => format!("Failed to {action}. Please try again."),
            Self::Validation(message) => message.clone(),
            Self::InvalidTransition { from, to, .. } => format!("An order that is {from} cannot be marked {to}."),
            Self::EmptyCart(_) => "Your cart is empty".to_string(),
            Self::Unauthenticated => "Please login to continue".to_string(),
            Self::Session(_) => "Could not update your session".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_keeps_not_found() {
        let err = StorefrontError::fetch("product")(StoreError::not_found("product", 4));
        assert!(matches!(err, StorefrontError::NotFound { resource: "product", .. }));
        assert_eq!(err.user_message(), "Product not found");

        let err = StorefrontError::fetch("product")(StoreError::Transport("reset".into()));
        assert!(matches!(err, StorefrontError::Fetch { what: "product", .. }));
    }

    #[test]
    fn test_write_message_names_action() {
        let err = StorefrontError::write("place order")(StoreError::Http { status: 500, message: String::new() });
        assert_eq!(err.user_message(), "Failed to place order. Please try again.");
    }
}
