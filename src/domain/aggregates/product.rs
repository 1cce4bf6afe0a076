//! Product Aggregate

use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{Money, ProductId, ShopId};

/// Catalog entry as the marketplace backend returns it.
///
/// Read-only from the cart's point of view: pricing works on the snapshot
/// fetched at computation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
    pub fn belongs_to(&self, shop: ShopId) -> bool { self.shop_id == shop }
}

/// Create/update payload for a vendor's product.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Filled in from the vendor's shop; any client-supplied value is overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<ShopId>,
}

impl ProductDraft {
    pub fn price_is_valid(&self) -> bool { !self.price.amount().is_sign_negative() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let p: Product = serde_json::from_str(r#"{"id":7,"shopId":2,"name":"Kettle","price":10.5,"stock":0}"#).unwrap();
        assert_eq!(p.id, ProductId(7));
        assert!(p.belongs_to(ShopId(2)));
        assert!(!p.is_in_stock());
        assert!(p.images.is_empty());
    }

    #[test]
    fn test_draft_requires_name() {
        let draft: ProductDraft = serde_json::from_str(r#"{"name":"","price":1}"#).unwrap();
        assert!(draft.validate().is_err());
    }
}
