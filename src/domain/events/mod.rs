//! Domain events
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::{CartId, Money, OrderId, ShopId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: OrderId, user_id: UserId, shop_id: ShopId, total: Money, lines: usize },
    CartCheckedOut { cart_id: CartId, order_id: OrderId },
    /// Checkout stopped after some writes were already committed.
    CheckoutAborted { cart_id: CartId, order_id: Option<OrderId>, committed: Vec<String>, failed: String },
    OrderStatusChanged { order_id: OrderId, from: OrderStatus, to: OrderStatus },
    ShopActivated { shop_id: ShopId, order_id: OrderId },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "order_placed",
            Self::CartCheckedOut { .. } => "cart_checked_out",
            Self::CheckoutAborted { .. } => "checkout_aborted",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::ShopActivated { .. } => "shop_activated",
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a DomainEvent,
}

/// Destination for events raised by the workflows. Publishing never fails the caller.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Publishes to `storefront.<event>` when a NATS client is configured.
#[derive(Clone, Default)]
pub struct NatsSink {
    client: Option<async_nats::Client>,
}

impl NatsSink {
    pub fn new(client: Option<async_nats::Client>) -> Self { Self { client } }
    pub fn disabled() -> Self { Self { client: None } }
}

impl std::fmt::Debug for NatsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsSink").field("enabled", &self.client.is_some()).finish()
    }
}

#[async_trait]
impl EventSink for NatsSink {
    async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.client else { return };
        let envelope = Envelope { id: Uuid::now_v7(), occurred_at: Utc::now(), event: &event };
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                return;
            }
        };
        let subject = format!("storefront.{}", event.name());
        if let Err(e) = client.publish(subject, payload.into()).await {
            tracing::warn!(event = event.name(), error = %e, "failed to publish event");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }
    pub async fn events(&self) -> Vec<DomainEvent> { self.events.lock().await.clone() }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, event: DomainEvent) { self.events.lock().await.push(event); }
}
