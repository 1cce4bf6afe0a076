//! Vendor shop and product management, plus the public catalog pages.

use serde::Serialize;
use validator::Validate;

use super::Marketplace;
use crate::domain::aggregates::{NewShop, Product, ProductDraft, Shop};
use crate::domain::value_objects::{ProductId, ShopId, UserId};
use crate::{Result, StorefrontError};

/// The seller's shop and everything it lists.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VendorCatalog {
    pub shop: Option<Shop>,
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub shop: Option<Shop>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShopDetail {
    pub shop: Shop,
    pub products: Vec<Product>,
}

impl Marketplace {
    pub async fn seller_shop(&self, owner: UserId) -> Result<VendorCatalog> {
        let shops = self.store.shops_by_owner(owner).await.map_err(StorefrontError::fetch("your shop"))?;
        let Some(shop) = shops.into_iter().next() else {
            return Ok(VendorCatalog::default());
        };
        let products = self.store.products_by_shop(shop.id).await.map_err(StorefrontError::fetch("your products"))?;
        Ok(VendorCatalog { shop: Some(shop), products })
    }

    /// Opens a shop for `owner`. New shops start dormant until their first
    /// confirmed order.
    pub async fn create_shop(&self, owner: UserId, mut shop: NewShop) -> Result<VendorCatalog> {
        shop.validate()?;
        if self.seller_shop(owner).await?.shop.is_some() {
            return Err(StorefrontError::Validation("You already have a shop".into()));
        }
        shop.owner_id = Some(owner);
        let created = self.store.create_shop(shop).await.map_err(StorefrontError::write("create shop"))?;
        tracing::info!(owner = %owner, shop = %created.id, "shop created");
        self.seller_shop(owner).await
    }

    /// Creates a product when `id` is `None`, otherwise replaces it.
    pub async fn save_product(&self, owner: UserId, id: Option<ProductId>, mut draft: ProductDraft) -> Result<VendorCatalog> {
        draft.validate()?;
        if !draft.price_is_valid() {
            return Err(StorefrontError::Validation("Price cannot be negative".into()));
        }
        let shop = self.owned_shop(owner).await?;
        draft.shop_id = Some(shop.id);

        match id {
            None => {
                let created = self.store.create_product(draft).await.map_err(StorefrontError::write("add product"))?;
                tracing::info!(shop = %shop.id, product = %created.id, "product added");
            }
            Some(id) => {
                self.owned_product(&shop, id).await?;
                self.store.update_product(id, draft).await.map_err(StorefrontError::write("update product"))?;
                tracing::info!(shop = %shop.id, product = %id, "product updated");
            }
        }
        self.seller_shop(owner).await
    }

    pub async fn delete_product(&self, owner: UserId, id: ProductId) -> Result<VendorCatalog> {
        let shop = self.owned_shop(owner).await?;
        self.owned_product(&shop, id).await?;
        self.store.delete_product(id).await.map_err(StorefrontError::write("delete product"))?;
        tracing::info!(shop = %shop.id, product = %id, "product deleted");
        self.seller_shop(owner).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.store.products().await.map_err(StorefrontError::fetch("products"))
    }

    pub async fn list_shops(&self) -> Result<Vec<Shop>> {
        self.store.shops().await.map_err(StorefrontError::fetch("shops"))
    }

    pub async fn product_detail(&self, id: ProductId) -> Result<ProductDetail> {
        let product = self.store.product(id).await.map_err(StorefrontError::fetch("product"))?;
        let shop = match self.store.shop(product.shop_id).await {
            Ok(shop) => Some(shop),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(StorefrontError::fetch("shop")(e)),
        };
        Ok(ProductDetail { product, shop })
    }

    pub async fn shop_detail(&self, id: ShopId) -> Result<ShopDetail> {
        let shop = self.store.shop(id).await.map_err(StorefrontError::fetch("shop"))?;
        let products = self.store.products_by_shop(id).await.map_err(StorefrontError::fetch("products"))?;
        Ok(ShopDetail { shop, products })
    }

    async fn owned_shop(&self, owner: UserId) -> Result<Shop> {
        self.seller_shop(owner)
            .await?
            .shop
            .ok_or_else(|| StorefrontError::Validation("Create your shop first".into()))
    }

    async fn owned_product(&self, shop: &Shop, id: ProductId) -> Result<Product> {
        let product = self.store.product(id).await.map_err(StorefrontError::fetch("product"))?;
        if !product.belongs_to(shop.id) {
            return Err(StorefrontError::NotFound { resource: "product", id: id.to_string() });
        }
        Ok(product)
    }
}
