//! Order pages: the customer's history and a vendor's received orders.
//!
//! An order may carry lines fulfilled by several shops. A vendor only ever
//! sees its own lines, and its total is the sum over those lines, not the
//! order's `total_amount`.

use futures::future::try_join_all;
use serde::Serialize;

use super::Marketplace;
use crate::catalog::{resolve_products, resolve_users};
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, Shop, User};
use crate::domain::value_objects::{Money, ShopId, UserId};
use crate::pricing::ProductMap;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub total_items: u64,
    pub seller_total: Money,
}

impl SellerOrderView {
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// The part of `order` that `shop` fulfils.
///
/// Lines whose product is not in `products` cannot be attributed to a shop
/// and are left out.
pub fn display_order(order: &Order, items: &[OrderItem], products: &ProductMap, shop: ShopId) -> SellerOrderView {
    let items: Vec<OrderItem> = items
        .iter()
        .filter(|i| i.order_id == order.id)
        .filter(|i| products.get(&i.product_id).is_some_and(|p| p.belongs_to(shop)))
        .cloned()
        .collect();
    SellerOrderView {
        order: order.clone(),
        total_items: items.iter().map(|i| u64::from(i.quantity.value())).sum(),
        seller_total: items.iter().map(OrderItem::line_total).sum(),
        items,
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedOrder {
    /// 1-based position among the vendor's visible orders.
    pub vendor_number: usize,
    #[serde(flatten)]
    pub view: SellerOrderView,
    pub customer: Option<User>,
    pub actions: Vec<OrderStatus>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReceivedOrders {
    pub shop: Option<Shop>,
    pub orders: Vec<ReceivedOrder>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CustomerOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub products: ProductMap,
}

impl Marketplace {
    /// Orders placed with the owner's shop, each reduced to the shop's own lines.
    pub async fn load_received_orders(&self, owner: UserId) -> Result<ReceivedOrders> {
        let shops = self.store.shops_by_owner(owner).await.map_err(StorefrontError::fetch("your shop"))?;
        let Some(shop) = shops.into_iter().next() else {
            return Ok(ReceivedOrders::default());
        };

        let orders = self.store.orders_by_shop(shop.id).await.map_err(StorefrontError::fetch("orders"))?;
        let items: Vec<OrderItem> = try_join_all(orders.iter().map(|o| self.store.order_items(o.id)))
            .await
            .map_err(StorefrontError::fetch("order items"))?
            .into_iter()
            .flatten()
            .collect();
        let products = resolve_products(self.store(), items.iter().map(|i| i.product_id))
            .await
            .map_err(StorefrontError::fetch("order products"))?;

        let views: Vec<SellerOrderView> = orders
            .iter()
            .map(|o| display_order(o, &items, &products, shop.id))
            .filter(|v| !v.is_empty())
            .collect();
        let customers = resolve_users(self.store(), views.iter().map(|v| v.order.user_id))
            .await
            .map_err(StorefrontError::fetch("customers"))?;

        let orders = views
            .into_iter()
            .enumerate()
            .map(|(n, view)| ReceivedOrder {
                vendor_number: n + 1,
                customer: customers.get(&view.order.user_id).cloned(),
                actions: view.order.status.seller_actions().to_vec(),
                view,
            })
            .collect();
        Ok(ReceivedOrders { shop: Some(shop), orders })
    }

    pub async fn load_customer_orders(&self, user: UserId) -> Result<Vec<CustomerOrder>> {
        let orders = self.store.orders_by_user(user).await.map_err(StorefrontError::fetch("your orders"))?;
        let items = try_join_all(orders.iter().map(|o| self.store.order_items(o.id)))
            .await
            .map_err(StorefrontError::fetch("order items"))?;
        let products = resolve_products(self.store(), items.iter().flatten().map(|i| i.product_id))
            .await
            .map_err(StorefrontError::fetch("order products"))?;

        Ok(orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| {
                let products = items
                    .iter()
                    .filter_map(|i| products.get(&i.product_id).map(|p| (p.id, p.clone())))
                    .collect();
                CustomerOrder { order, items, products }
            })
            .collect())
    }
}
