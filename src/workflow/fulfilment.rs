//! Seller-driven order status changes.

use serde::Serialize;

use super::{Marketplace, ReceivedOrders};
use crate::domain::aggregates::{Order, OrderStatus, ShopPatch};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{OrderId, UserId};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order: Order,
    /// Set when this change activated the seller's dormant shop.
    pub shop_activated: bool,
    pub received: ReceivedOrders,
}

impl Marketplace {
    /// Moves an order of the seller's shop to `target`.
    ///
    /// The transition is checked against the freshly fetched order before
    /// anything is written. Confirming an order activates the seller's shop
    /// if it is still dormant; that check runs only after the status write
    /// has been acknowledged.
    pub async fn advance_status(&self, seller: UserId, order_id: OrderId, target: OrderStatus) -> Result<StatusChange> {
        let order = self.store.order(order_id).await.map_err(StorefrontError::fetch("order"))?;

        let shops = self.store.shops_by_owner(seller).await.map_err(StorefrontError::fetch("your shop"))?;
        let shop = shops
            .into_iter()
            .next()
            .filter(|s| s.id == order.shop_id)
            .ok_or_else(|| StorefrontError::NotFound { resource: "order", id: order_id.to_string() })?;

        if !order.status.can_transition_to(target) {
            tracing::warn!(order = %order_id, from = %order.status, to = %target, "rejected status change");
            return Err(StorefrontError::InvalidTransition { order_id, from: order.status, to: target });
        }

        let updated = self
            .store
            .update_order_status(order_id, target)
            .await
            .map_err(StorefrontError::write("update order status"))?;
        tracing::info!(order = %order_id, shop = %shop.id, from = %order.status, to = %target, "order status changed");
        self.raise(DomainEvent::OrderStatusChanged { order_id, from: order.status, to: target }).await;

        let mut shop_activated = false;
        if target == OrderStatus::Confirmed {
            let current = self
                .store
                .shops_by_owner(seller)
                .await
                .map_err(StorefrontError::fetch("your shop"))?
                .into_iter()
                .find(|s| s.id == shop.id);
            if let Some(current) = current.filter(|s| !s.is_active) {
                self.store
                    .update_shop(current.id, ShopPatch::activate())
                    .await
                    .map_err(StorefrontError::write("activate shop"))?;
                tracing::info!(shop = %current.id, order = %order_id, "first confirmed order activated shop");
                self.raise(DomainEvent::ShopActivated { shop_id: current.id, order_id }).await;
                shop_activated = true;
            }
        }

        let received = self.load_received_orders(seller).await?;
        Ok(StatusChange { order: updated, shop_activated, received })
    }
}
