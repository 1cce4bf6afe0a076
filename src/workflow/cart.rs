//! Customer cart: loading, adding, quantity changes, removal.

use futures::future::try_join_all;
use serde::Serialize;

use super::Marketplace;
use crate::catalog::resolve_products;
use crate::domain::aggregates::{Cart, CartItem, CartItemUpdate, NewCart, NewCartItem, Product};
use crate::domain::value_objects::{CartItemId, Money, ProductId, Quantity, UserId};
use crate::pricing::{compute_totals, is_pricing_complete, CartTotals, ProductMap};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
    pub line_total: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    /// False while some line's product is still unknown; the totals are then provisional.
    pub priced: bool,
}

/// Every open cart of a user with per-cart totals and the cross-cart aggregate.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CartSnapshot {
    pub carts: Vec<CartView>,
    pub summary: CartTotals,
}

impl CartSnapshot {
    /// Lines whose product is missing from `products` are left out of the views.
    pub fn build(carts: Vec<Cart>, items: &[CartItem], products: &ProductMap) -> Self {
        let carts = carts
            .into_iter()
            .map(|cart| {
                let lines = items
                    .iter()
                    .filter(|i| i.cart_id == cart.id)
                    .filter_map(|i| {
                        products.get(&i.product_id).map(|p| CartLine {
                            item: i.clone(),
                            product: p.clone(),
                            line_total: p.price * i.quantity,
                        })
                    })
                    .collect();
                let totals = compute_totals(items, products, Some(cart.id));
                let priced = is_pricing_complete(items, products, Some(cart.id));
                CartView { cart, lines, totals, priced }
            })
            .collect();
        Self { carts, summary: compute_totals(items, products, None) }
    }

    pub fn is_empty(&self) -> bool { self.carts.iter().all(|c| c.lines.is_empty()) }

    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.carts.iter().flat_map(|c| &c.lines).map(|l| &l.item).find(|i| i.id == id)
    }
}

impl Marketplace {
    pub async fn load_carts(&self, user: UserId) -> Result<CartSnapshot> {
        let carts = self.store.carts_by_user(user).await.map_err(StorefrontError::fetch("your cart"))?;
        if carts.is_empty() {
            return Ok(CartSnapshot::default());
        }

        let items: Vec<CartItem> = try_join_all(carts.iter().map(|c| self.store.cart_items(c.id)))
            .await
            .map_err(StorefrontError::fetch("cart items"))?
            .into_iter()
            .flatten()
            .collect();

        let products = resolve_products(self.store(), items.iter().map(|i| i.product_id))
            .await
            .map_err(StorefrontError::fetch("cart products"))?;

        Ok(CartSnapshot::build(carts, &items, &products))
    }

    /// Adds to the user's cart for the product's shop, opening that cart if needed.
    pub async fn add_to_cart(&self, user: UserId, product_id: ProductId, quantity: Quantity) -> Result<CartItem> {
        let product = self.store.product(product_id).await.map_err(StorefrontError::fetch("product"))?;
        let carts = self.store.carts_by_user(user).await.map_err(StorefrontError::fetch("your cart"))?;

        let cart = match Cart::first_for_shop(&carts, product.shop_id) {
            Some(cart) => cart.clone(),
            None => {
                let created = self
                    .store
                    .create_cart(NewCart { user_id: user, shop_id: product.shop_id })
                    .await
                    .map_err(StorefrontError::write("create cart"))?;
                tracing::debug!(cart = %created.id, shop = %product.shop_id, "opened cart");
                created
            }
        };

        let item = self
            .store
            .add_cart_item(cart.id, NewCartItem { product_id, quantity })
            .await
            .map_err(StorefrontError::write("add item to cart"))?;
        tracing::info!(user = %user, cart = %cart.id, product = %product_id, quantity = %quantity, "added to cart");
        Ok(item)
    }

    /// Quantities below one are rejected without touching the backend.
    pub async fn update_quantity(&self, user: UserId, item_id: CartItemId, quantity: i64) -> Result<CartSnapshot> {
        let quantity = Quantity::new(quantity).map_err(|e| StorefrontError::Validation(e.to_string()))?;
        let snapshot = self.load_carts(user).await?;
        let item = snapshot
            .item(item_id)
            .ok_or_else(|| StorefrontError::NotFound { resource: "cart item", id: item_id.to_string() })?;

        self.store
            .update_cart_item(item_id, CartItemUpdate::with_quantity(item, quantity))
            .await
            .map_err(StorefrontError::write("update quantity"))?;
        self.load_carts(user).await
    }

    pub async fn remove_item(&self, user: UserId, item_id: CartItemId) -> Result<CartSnapshot> {
        let snapshot = self.load_carts(user).await?;
        if snapshot.item(item_id).is_none() {
            return Err(StorefrontError::NotFound { resource: "cart item", id: item_id.to_string() });
        }
        self.store.remove_cart_item(item_id).await.map_err(StorefrontError::write("remove item"))?;
        self.load_carts(user).await
    }
}
