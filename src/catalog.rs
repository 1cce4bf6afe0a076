//! Batch lookups behind the cart and order pages.
//!
//! Each distinct id is fetched once, all requests run concurrently, and the
//! batch fails as a whole if any single lookup fails.

use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};

use crate::domain::aggregates::User;
use crate::domain::value_objects::{ProductId, UserId};
use crate::pricing::ProductMap;
use crate::store::{StoreResult, Storefront};

pub async fn resolve_products<S>(store: &S, ids: impl IntoIterator<Item = ProductId>) -> StoreResult<ProductMap>
where
    S: Storefront + ?Sized,
{
    let ids: BTreeSet<ProductId> = ids.into_iter().collect();
    let products = try_join_all(ids.into_iter().map(|id| store.product(id))).await?;
    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn resolve_users<S>(store: &S, ids: impl IntoIterator<Item = UserId>) -> StoreResult<HashMap<UserId, User>>
where
    S: Storefront + ?Sized,
{
    let ids: BTreeSet<UserId> = ids.into_iter().collect();
    let users = try_join_all(ids.into_iter().map(|id| store.user(id))).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};
    use crate::domain::value_objects::ShopId;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_duplicates_resolve_once() {
        let store = MemoryStore::new();
        let a = store.seed_product(ShopId(1), "A", Decimal::ONE, 1).await;
        let b = store.seed_product(ShopId(1), "B", Decimal::TWO, 1).await;
        let map = resolve_products(&store, [a.id, b.id, a.id]).await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&b.id].name, "B");
    }

    #[tokio::test]
    async fn test_one_missing_product_fails_the_batch() {
        let store = MemoryStore::new();
        let a = store.seed_product(ShopId(1), "A", Decimal::ONE, 1).await;
        let err = resolve_products(&store, [a.id, ProductId(999)]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_backend_failure_fails_the_batch() {
        let store = MemoryStore::new();
        let a = store.seed_product(ShopId(1), "A", Decimal::ONE, 1).await;
        store.fail(StoreOp::GetProduct).await;
        assert!(resolve_products(&store, [a.id]).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = MemoryStore::new();
        assert!(resolve_products(&store, []).await.unwrap().is_empty());
    }
}
