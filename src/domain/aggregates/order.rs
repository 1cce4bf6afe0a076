//! Order Aggregate

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::value_objects::{Money, OrderId, OrderItemId, PaymentMethod, ProductId, Quantity, ShippingAddress, ShopId, UserId};

/// Order-wide fulfilment status. Moves forward only:
///
/// ```text
/// PENDING -> CONFIRMED -> DELIVERED | COMPLETED
/// PENDING -> CANCELLED
/// ```
///
/// `SHIPPED` is set by the backend, never by a seller here. Any other value
/// the backend stores reads as `Unknown`; neither offers seller actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    /// Targets a seller may move an order to from this status.
    pub fn seller_actions(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Delivered, Self::Completed],
            Self::Shipped | Self::Delivered | Self::Completed | Self::Cancelled | Self::Unknown => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool { self.seller_actions().contains(&target) }
    pub fn is_final(&self) -> bool { self.seller_actions().is_empty() }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|_| {
            tracing::warn!(status = %raw, "unrecognised order status");
            Self::Unknown
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

/// An order as persisted by the backend. Immutable apart from `status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    /// Whole-order total across every shop, including tax and shipping.
    pub total_amount: Money,
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Order line with the unit price frozen at checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(alias = "priceAtTime")]
    pub price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money { self.price * self.quantity }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Money,
}
