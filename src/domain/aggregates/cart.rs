//! Cart Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{CartId, CartItemId, ProductId, Quantity, ShopId, UserId};

/// Per-user, per-shop staging area. Destroyed on checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub shop_id: ShopId,
}

impl Cart {
    /// Canonical cart for a shop: the first listed match.
    pub fn first_for_shop(carts: &[Cart], shop: ShopId) -> Option<&Cart> {
        carts.iter().find(|c| c.shop_id == shop)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl CartItem {
    pub fn in_cart(&self, scope: Option<CartId>) -> bool {
        scope.map_or(true, |cart| self.cart_id == cart)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCart {
    pub user_id: UserId,
    pub shop_id: ShopId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Full replacement written back for a quantity change; the backend expects every field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemUpdate {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl CartItemUpdate {
    pub fn with_quantity(item: &CartItem, quantity: Quantity) -> Self {
        Self { cart_id: item.cart_id, product_id: item.product_id, quantity }
    }
}
