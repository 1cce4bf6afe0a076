//! Checkout: one cart becomes one order.
//!
//! Steps run strictly in sequence, each a separate backend write:
//! create the order, record one order line per priced cart line, delete the
//! cart, then sweep the cart's item rows. There is no transaction; if a
//! step fails after earlier ones committed, the committed steps stay and are
//! logged and published for reconciliation.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Marketplace;
use crate::catalog::resolve_products;
use crate::domain::aggregates::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{CartId, OrderId, PaymentMethod, ShippingAddress, UserId};
use crate::pricing::{compute_totals, CartTotals};
use crate::store::StoreError;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    #[validate(length(min = 1, max = 500, message = "shipping address is required"))]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub totals: CartTotals,
}

/// Steps of one checkout that the backend has acknowledged.
#[derive(Debug)]
struct CheckoutLog {
    cart: CartId,
    order: Option<OrderId>,
    committed: Vec<String>,
}

impl CheckoutLog {
    fn new(cart: CartId) -> Self { Self { cart, order: None, committed: Vec::new() } }

    fn commit(&mut self, step: String) {
        tracing::debug!(cart = %self.cart, step = %step, "checkout step committed");
        self.committed.push(step);
    }

    async fn abort(self, market: &Marketplace, action: &'static str, source: StoreError) -> StorefrontError {
        if self.committed.is_empty() {
            tracing::warn!(cart = %self.cart, failed = action, error = %source, "checkout failed before any write");
        } else {
            tracing::error!(
                cart = %self.cart,
                order = ?self.order,
                committed = ?self.committed,
                failed = action,
                error = %source,
                "checkout partially committed; needs manual reconciliation"
            );
            market
                .raise(DomainEvent::CheckoutAborted {
                    cart_id: self.cart,
                    order_id: self.order,
                    committed: self.committed,
                    failed: action.to_string(),
                })
                .await;
        }
        StorefrontError::write(action)(source)
    }
}

impl Marketplace {
    /// Turns `request.cart_id`, which must belong to `user`, into a pending order.
    ///
    /// Pricing is recomputed from freshly fetched items and products; the
    /// product fetch is all-or-nothing, so the total is never taken from a
    /// partial catalog.
    pub async fn checkout(&self, user: UserId, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        request.validate()?;
        let shipping_address =
            ShippingAddress::new(&request.shipping_address).map_err(|e| StorefrontError::Validation(e.to_string()))?;

        let carts = self.store.carts_by_user(user).await.map_err(StorefrontError::fetch("your cart"))?;
        let cart = carts
            .into_iter()
            .find(|c| c.id == request.cart_id)
            .ok_or_else(|| StorefrontError::NotFound { resource: "cart", id: request.cart_id.to_string() })?;

        let items = self.store.cart_items(cart.id).await.map_err(StorefrontError::fetch("cart items"))?;
        let products = resolve_products(self.store(), items.iter().map(|i| i.product_id))
            .await
            .map_err(StorefrontError::fetch("cart products"))?;

        let priced: Vec<_> =
            items.iter().filter_map(|i| products.get(&i.product_id).map(|p| (i, p))).collect();
        if priced.is_empty() {
            return Err(StorefrontError::EmptyCart(cart.id));
        }
        let totals = compute_totals(&items, &products, Some(cart.id));

        let mut log = CheckoutLog::new(cart.id);

        let new_order = NewOrder {
            user_id: user,
            shop_id: cart.shop_id,
            total_amount: totals.total,
            shipping_address,
            payment_method: request.payment_method,
            status: OrderStatus::Pending,
        };
        let order = match self.store.create_order(new_order).await {
            Ok(order) => order,
            Err(e) => return Err(log.abort(self, "place order", e).await),
        };
        log.order = Some(order.id);
        log.commit(format!("order {}", order.id));

        let mut order_items = Vec::with_capacity(priced.len());
        for (item, product) in priced {
            let line = NewOrderItem {
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: product.price,
            };
            match self.store.create_order_item(line).await {
                Ok(created) => {
                    log.commit(format!("order item {}", created.id));
                    order_items.push(created);
                }
                Err(e) => return Err(log.abort(self, "record order items", e).await),
            }
        }

        if let Err(e) = self.store.delete_cart(cart.id).await {
            return Err(log.abort(self, "clear cart", e).await);
        }
        log.commit(format!("cart {} deleted", cart.id));

        self.sweep_cart_items(&items).await;

        tracing::info!(
            user = %user,
            cart = %cart.id,
            order = %order.id,
            lines = order_items.len(),
            total = %totals.total.amount(),
            "order placed"
        );
        self.raise(DomainEvent::OrderPlaced {
            order_id: order.id,
            user_id: user,
            shop_id: order.shop_id,
            total: order.total_amount,
            lines: order_items.len(),
        })
        .await;
        self.raise(DomainEvent::CartCheckedOut { cart_id: cart.id, order_id: order.id }).await;

        Ok(CheckoutReceipt { order, items: order_items, totals })
    }

    /// Removes item rows of a deleted cart. The order is already placed, so
    /// failures are only logged; rows the backend already cascaded are skipped.
    async fn sweep_cart_items(&self, items: &[CartItem]) {
        let results = join_all(items.iter().map(|i| self.store.remove_cart_item(i.id))).await;
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => tracing::warn!(cart = %item.cart_id, item = %item.id, error = %e, "orphaned cart item left behind"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;
    use crate::store::{StoreOp, Storefront};
    use crate::workflow::testing::fixture;
    use rust_decimal_macros::dec;

    fn request(cart_id: CartId) -> CheckoutRequest {
        CheckoutRequest { cart_id, shipping_address: "12 MG Road, Pune".into(), payment_method: PaymentMethod::CashOnDelivery }
    }

    #[tokio::test]
    async fn test_checkout_places_order_with_frozen_prices() {
        let f = fixture().await;
        let first = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(2).unwrap()).await.unwrap();
        f.market.add_to_cart(f.customer.id, f.plate.id, Quantity::new(1).unwrap()).await.unwrap();

        let receipt = f.market.checkout(f.customer.id, request(first.cart_id)).await.unwrap();

        assert_eq!(receipt.totals.subtotal.amount(), dec!(25));
        assert_eq!(receipt.totals.tax.amount(), dec!(2));
        assert_eq!(receipt.totals.shipping.amount(), dec!(99));
        assert_eq!(receipt.order.total_amount.amount(), dec!(126));
        assert_eq!(receipt.order.status, OrderStatus::Pending);
        assert_eq!(receipt.order.shop_id, f.shop.id);
        assert_eq!(receipt.order.shipping_address, "12 MG Road, Pune");

        let lines = f.store.order_items(receipt.order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        let mug_line = lines.iter().find(|l| l.product_id == f.mug.id).unwrap();
        assert_eq!(mug_line.price.amount(), dec!(10));
        assert_eq!(mug_line.quantity.value(), 2);

        assert!(f.store.carts_by_user(f.customer.id).await.unwrap().is_empty());
        assert!(f.store.all_cart_items().await.is_empty());
    }

    #[tokio::test]
    async fn test_writes_run_in_order() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        let before = f.store.writes().await.len();

        f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap();

        let writes = f.store.writes().await;
        assert_eq!(
            writes[before..],
            [StoreOp::CreateOrder, StoreOp::CreateOrderItem, StoreOp::DeleteCart, StoreOp::RemoveCartItem]
        );
        let names: Vec<_> = f.events.events().await.iter().map(DomainEvent::name).collect();
        assert_eq!(names, ["order_placed", "cart_checked_out"]);
    }

    #[tokio::test]
    async fn test_only_the_chosen_cart_is_checked_out() {
        let f = fixture().await;
        let clay = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        let loom = f.market.add_to_cart(f.customer.id, f.rug.id, Quantity::new(2).unwrap()).await.unwrap();

        let receipt = f.market.checkout(f.customer.id, request(loom.cart_id)).await.unwrap();

        assert_eq!(receipt.order.total_amount.amount(), dec!(64.8));
        let remaining = f.store.carts_by_user(f.customer.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, clay.cart_id);
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected_before_any_fetch() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.fail(StoreOp::ListCarts).await;

        let mut req = request(item.cart_id);
        req.shipping_address = "   ".into();
        let err = f.market.checkout(f.customer.id, req).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.remove_cart_item(item.id).await.unwrap();

        let err = f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::EmptyCart(_)));
        assert!(f.store.all_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_someone_elses_cart_is_not_found() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        let err = f.market.checkout(f.seller.id, request(item.cart_id)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound { resource: "cart", .. }));
    }

    #[tokio::test]
    async fn test_product_fetch_failure_places_nothing() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.fail(StoreOp::GetProduct).await;

        let err = f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Fetch { what: "cart products", .. }));
        assert!(f.store.all_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_line_keeps_committed_order_and_cart() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.fail(StoreOp::CreateOrderItem).await;

        let err = f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap_err();

        assert!(matches!(err, StorefrontError::Write { action: "record order items", .. }));
        assert_eq!(err.user_message(), "Failed to record order items. Please try again.");
        assert_eq!(f.store.all_orders().await.len(), 1);
        assert_eq!(f.store.carts_by_user(f.customer.id).await.unwrap().len(), 1);
        match f.events.events().await.as_slice() {
            [DomainEvent::CheckoutAborted { order_id: Some(_), committed, failed, .. }] => {
                assert_eq!(committed.len(), 1);
                assert_eq!(failed, "record order items");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_order_creation_raises_no_abort_event() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.fail(StoreOp::CreateOrder).await;

        let err = f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Write { action: "place order", .. }));
        assert!(f.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_item_sweep_still_places_order() {
        let f = fixture().await;
        let item = f.market.add_to_cart(f.customer.id, f.mug.id, Quantity::new(1).unwrap()).await.unwrap();
        f.store.fail(StoreOp::RemoveCartItem).await;

        let receipt = f.market.checkout(f.customer.id, request(item.cart_id)).await.unwrap();
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(f.store.all_cart_items().await.len(), 1);
    }
}
