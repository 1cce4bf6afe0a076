//! Shop Aggregate

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{ShopId, UserId};

/// A vendor's storefront. Owns products and receives orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    /// A shop stays dormant until its first order is confirmed. Missing means dormant.
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewShop {
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ShopPatch {
    pub fn activate() -> Self { Self { is_active: Some(true), ..Self::default() } }

    pub fn apply(&self, shop: &mut Shop) {
        if let Some(name) = &self.name { shop.name = name.clone(); }
        if let Some(description) = &self.description { shop.description = Some(description.clone()); }
        if let Some(active) = self.is_active { shop.is_active = active; }
    }
}
