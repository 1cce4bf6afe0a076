//! In-memory marketplace store.
//!
//! Backs the offline mode of the binary and the workflow tests. Deleting a
//! cart does not cascade to its items, matching the weakest backend the
//! workflows must cope with.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, Storefront};
use crate::domain::aggregates::{
    Cart, CartItem, CartItemUpdate, Credentials, LoginResponse, NewCart, NewCartItem, NewOrder, NewOrderItem,
    NewShop, NewUser, Order, OrderItem, OrderStatus, Product, ProductDraft, Shop, ShopPatch, User,
};
use crate::domain::value_objects::{CartId, CartItemId, Money, OrderId, OrderItemId, ProductId, ShopId, UserId};

/// Operations of the store, used to inject failures and to inspect writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetProduct,
    GetShop,
    ListCarts,
    ListCartItems,
    ListOrders,
    ListOrderItems,
    GetOrder,
    GetUser,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateShop,
    UpdateShop,
    CreateCart,
    AddCartItem,
    DeleteCart,
    UpdateCartItem,
    RemoveCartItem,
    CreateOrder,
    UpdateOrderStatus,
    CreateOrderItem,
    Register,
}

impl StoreOp {
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::GetProduct | Self::GetShop | Self::ListCarts | Self::ListCartItems | Self::ListOrders
                | Self::ListOrderItems | Self::GetOrder | Self::GetUser
        )
    }
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    products: BTreeMap<ProductId, Product>,
    shops: BTreeMap<ShopId, Shop>,
    carts: BTreeMap<CartId, Cart>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    users: BTreeMap<UserId, (User, String)>,
    failing: HashSet<StoreOp>,
    writes: Vec<StoreOp>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn gate(&mut self, op: StoreOp) -> StoreResult<()> {
        if self.failing.contains(&op) {
            return Err(StoreError::Http { status: 503, message: format!("{op:?} unavailable") });
        }
        if op.is_write() {
            self.writes.push(op);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// A small catalog for running without a backend: two vendors, one customer.
    pub async fn demo() -> Self {
        let store = Self::new();
        let customer = store.seed_user("Asha Customer", "asha@example.com", "password").await;
        let potter = store.seed_user("Ravi Potter", "ravi@example.com", "password").await;
        let weaver = store.seed_user("Meera Weaver", "meera@example.com", "password").await;
        let clay = store.seed_shop(potter.id, "Clay Corner", false).await;
        let loom = store.seed_shop(weaver.id, "Loom House", true).await;
        store.seed_product(clay.id, "Terracotta Mug", rust_decimal::Decimal::new(1250, 2), 40).await;
        store.seed_product(clay.id, "Planter", rust_decimal::Decimal::new(3400, 2), 12).await;
        store.seed_product(loom.id, "Cotton Dhurrie", rust_decimal::Decimal::new(89900, 2), 5).await;
        tracing::debug!(customer = %customer.id, "seeded demo catalog");
        store
    }

    pub async fn seed_user(&self, name: &str, email: &str, password: &str) -> User {
        let mut t = self.tables.write().await;
        let user = User { id: UserId(t.next_id()), name: name.into(), email: email.into(), role: None };
        t.users.insert(user.id, (user.clone(), password.into()));
        user
    }

    pub async fn seed_shop(&self, owner: UserId, name: &str, is_active: bool) -> Shop {
        let mut t = self.tables.write().await;
        let shop = Shop {
            id: ShopId(t.next_id()), owner_id: owner, name: name.into(), description: None, address: None,
            city: None, state: None, zip_code: None, is_active,
        };
        t.shops.insert(shop.id, shop.clone());
        shop
    }

    pub async fn seed_product(&self, shop: ShopId, name: &str, price: rust_decimal::Decimal, stock: u32) -> Product {
        let mut t = self.tables.write().await;
        let product = Product {
            id: ProductId(t.next_id()), shop_id: shop, name: name.into(), description: String::new(),
            price: Money::new(price), stock, category: String::new(), brand: None, sku: None, images: vec![],
        };
        t.products.insert(product.id, product.clone());
        product
    }

    /// Makes every later call of `op` fail with a 503.
    pub async fn fail(&self, op: StoreOp) { self.tables.write().await.failing.insert(op); }
    pub async fn recover(&self, op: StoreOp) { self.tables.write().await.failing.remove(&op); }

    /// Successful writes, in the order they were applied.
    pub async fn writes(&self) -> Vec<StoreOp> { self.tables.read().await.writes.clone() }

    /// Every cart item row, including rows whose cart is gone.
    pub async fn all_cart_items(&self) -> Vec<CartItem> { self.tables.read().await.cart_items.values().cloned().collect() }

    pub async fn all_orders(&self) -> Vec<Order> { self.tables.read().await.orders.values().cloned().collect() }

    async fn read(&self, op: StoreOp) -> StoreResult<tokio::sync::RwLockReadGuard<'_, Tables>> {
        let t = self.tables.read().await;
        if t.failing.contains(&op) {
            return Err(StoreError::Http { status: 503, message: format!("{op:?} unavailable") });
        }
        Ok(t)
    }

    async fn write(&self, op: StoreOp) -> StoreResult<tokio::sync::RwLockWriteGuard<'_, Tables>> {
        let mut t = self.tables.write().await;
        t.gate(op)?;
        Ok(t)
    }
}

#[async_trait]
impl Storefront for MemoryStore {
    async fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read(StoreOp::GetProduct).await?.products.values().cloned().collect())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Product> {
        self.read(StoreOp::GetProduct).await?.products.get(&id).cloned().ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn products_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Product>> {
        let t = self.read(StoreOp::GetProduct).await?;
        Ok(t.products.values().filter(|p| p.shop_id == shop).cloned().collect())
    }

    async fn create_product(&self, draft: ProductDraft) -> StoreResult<Product> {
        let mut t = self.write(StoreOp::CreateProduct).await?;
        let shop_id = draft.shop_id.ok_or_else(|| StoreError::Rejected("shopId is required".into()))?;
        let product = Product {
            id: ProductId(t.next_id()), shop_id, name: draft.name, description: draft.description, price: draft.price,
            stock: draft.stock, category: draft.category, brand: draft.brand, sku: draft.sku, images: draft.images,
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> StoreResult<Product> {
        let mut t = self.write(StoreOp::UpdateProduct).await?;
        let product = t.products.get_mut(&id).ok_or_else(|| StoreError::not_found("product", id))?;
        product.name = draft.name;
        product.description = draft.description;
        product.price = draft.price;
        product.stock = draft.stock;
        product.category = draft.category;
        product.brand = draft.brand;
        product.sku = draft.sku;
        product.images = draft.images;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut t = self.write(StoreOp::DeleteProduct).await?;
        t.products.remove(&id).map(|_| ()).ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn shops(&self) -> StoreResult<Vec<Shop>> {
        Ok(self.read(StoreOp::GetShop).await?.shops.values().cloned().collect())
    }

    async fn shop(&self, id: ShopId) -> StoreResult<Shop> {
        self.read(StoreOp::GetShop).await?.shops.get(&id).cloned().ok_or_else(|| StoreError::not_found("shop", id))
    }

    async fn shops_by_owner(&self, owner: UserId) -> StoreResult<Vec<Shop>> {
        let t = self.read(StoreOp::GetShop).await?;
        Ok(t.shops.values().filter(|s| s.owner_id == owner).cloned().collect())
    }

    async fn create_shop(&self, shop: NewShop) -> StoreResult<Shop> {
        let mut t = self.write(StoreOp::CreateShop).await?;
        let owner_id = shop.owner_id.ok_or_else(|| StoreError::Rejected("ownerId is required".into()))?;
        let created = Shop {
            id: ShopId(t.next_id()), owner_id, name: shop.name, description: shop.description, address: shop.address,
            city: shop.city, state: shop.state, zip_code: shop.zip_code, is_active: false,
        };
        t.shops.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop> {
        let mut t = self.write(StoreOp::UpdateShop).await?;
        let shop = t.shops.get_mut(&id).ok_or_else(|| StoreError::not_found("shop", id))?;
        patch.apply(shop);
        Ok(shop.clone())
    }

    async fn carts_by_user(&self, user: UserId) -> StoreResult<Vec<Cart>> {
        let t = self.read(StoreOp::ListCarts).await?;
        Ok(t.carts.values().filter(|c| c.user_id == user).cloned().collect())
    }

    async fn create_cart(&self, cart: NewCart) -> StoreResult<Cart> {
        let mut t = self.write(StoreOp::CreateCart).await?;
        let created = Cart { id: CartId(t.next_id()), user_id: cart.user_id, shop_id: cart.shop_id };
        t.carts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn add_cart_item(&self, cart: CartId, item: NewCartItem) -> StoreResult<CartItem> {
        let mut t = self.write(StoreOp::AddCartItem).await?;
        if !t.carts.contains_key(&cart) {
            return Err(StoreError::not_found("cart", cart));
        }
        if !t.products.contains_key(&item.product_id) {
            return Err(StoreError::Rejected(format!("product {} does not exist", item.product_id)));
        }
        let created = CartItem { id: CartItemId(t.next_id()), cart_id: cart, product_id: item.product_id, quantity: item.quantity };
        t.cart_items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_cart(&self, cart: CartId) -> StoreResult<()> {
        let mut t = self.write(StoreOp::DeleteCart).await?;
        t.carts.remove(&cart).map(|_| ()).ok_or_else(|| StoreError::not_found("cart", cart))
    }

    async fn cart_items(&self, cart: CartId) -> StoreResult<Vec<CartItem>> {
        let t = self.read(StoreOp::ListCartItems).await?;
        if !t.carts.contains_key(&cart) {
            return Err(StoreError::not_found("cart", cart));
        }
        Ok(t.cart_items.values().filter(|i| i.cart_id == cart).cloned().collect())
    }

    async fn update_cart_item(&self, id: CartItemId, update: CartItemUpdate) -> StoreResult<CartItem> {
        let mut t = self.write(StoreOp::UpdateCartItem).await?;
        let item = t.cart_items.get_mut(&id).ok_or_else(|| StoreError::not_found("cart item", id))?;
        item.cart_id = update.cart_id;
        item.product_id = update.product_id;
        item.quantity = update.quantity;
        Ok(item.clone())
    }

    async fn remove_cart_item(&self, id: CartItemId) -> StoreResult<()> {
        let mut t = self.write(StoreOp::RemoveCartItem).await?;
        t.cart_items.remove(&id).map(|_| ()).ok_or_else(|| StoreError::not_found("cart item", id))
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut t = self.write(StoreOp::CreateOrder).await?;
        let created = Order {
            id: OrderId(t.next_id()),
            user_id: order.user_id,
            shop_id: order.shop_id,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.into(),
            payment_method: order.payment_method,
            payment_status: Some("PENDING".into()),
            status: order.status,
            created_at: Some(Utc::now().naive_utc()),
        };
        t.orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Order> {
        self.read(StoreOp::GetOrder).await?.orders.get(&id).cloned().ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn orders_by_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let t = self.read(StoreOp::ListOrders).await?;
        Ok(t.orders.values().filter(|o| o.user_id == user).cloned().collect())
    }

    async fn orders_by_shop(&self, shop: ShopId) -> StoreResult<Vec<Order>> {
        let t = self.read(StoreOp::ListOrders).await?;
        Ok(t.orders.values().filter(|o| o.shop_id == shop).cloned().collect())
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        let mut t = self.write(StoreOp::UpdateOrderStatus).await?;
        let order = t.orders.get_mut(&id).ok_or_else(|| StoreError::not_found("order", id))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn order_items(&self, order: OrderId) -> StoreResult<Vec<OrderItem>> {
        let t = self.read(StoreOp::ListOrderItems).await?;
        Ok(t.order_items.values().filter(|i| i.order_id == order).cloned().collect())
    }

    async fn create_order_item(&self, item: NewOrderItem) -> StoreResult<OrderItem> {
        let mut t = self.write(StoreOp::CreateOrderItem).await?;
        if !t.orders.contains_key(&item.order_id) {
            return Err(StoreError::not_found("order", item.order_id));
        }
        let created = OrderItem {
            id: OrderItemId(t.next_id()), order_id: item.order_id, product_id: item.product_id,
            quantity: item.quantity, price: item.price,
        };
        t.order_items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn user(&self, id: UserId) -> StoreResult<User> {
        let t = self.read(StoreOp::GetUser).await?;
        t.users.get(&id).map(|(u, _)| u.clone()).ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn login(&self, credentials: Credentials) -> StoreResult<LoginResponse> {
        let t = self.read(StoreOp::GetUser).await?;
        let email = credentials.email.trim();
        t.users
            .values()
            .find(|(u, password)| u.email.eq_ignore_ascii_case(email) && *password == credentials.password)
            .map(|(u, _)| LoginResponse { user: u.clone(), token: format!("memory-{}", u.id) })
            .ok_or_else(|| StoreError::Rejected("Invalid credentials".into()))
    }

    async fn register(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.write(StoreOp::Register).await?;
        if t.users.values().any(|(u, _)| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Rejected("Email already registered".into()));
        }
        let created = User { id: UserId(t.next_id()), name: user.name, email: user.email, role: user.role };
        t.users.insert(created.id, (created.clone(), user.password));
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;

    #[tokio::test]
    async fn test_cart_delete_leaves_items_behind() {
        let store = MemoryStore::new();
        let shop = store.seed_shop(UserId(100), "S", true).await;
        let product = store.seed_product(shop.id, "P", rust_decimal::Decimal::ONE, 1).await;
        let cart = store.create_cart(NewCart { user_id: UserId(1), shop_id: shop.id }).await.unwrap();
        store.add_cart_item(cart.id, NewCartItem { product_id: product.id, quantity: Quantity::new(1).unwrap() }).await.unwrap();

        store.delete_cart(cart.id).await.unwrap();

        assert!(store.carts_by_user(UserId(1)).await.unwrap().is_empty());
        assert_eq!(store.all_cart_items().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_logged() {
        let store = MemoryStore::new();
        store.fail(StoreOp::CreateCart).await;
        assert!(store.create_cart(NewCart { user_id: UserId(1), shop_id: ShopId(1) }).await.is_err());
        store.recover(StoreOp::CreateCart).await;
        store.create_cart(NewCart { user_id: UserId(1), shop_id: ShopId(1) }).await.unwrap();
        assert_eq!(store.writes().await, vec![StoreOp::CreateCart]);
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let store = MemoryStore::new();
        store.seed_user("A", "a@example.com", "secret").await;
        let ok = Credentials { email: "A@example.com".into(), password: "secret".into() };
        assert_eq!(store.login(ok).await.unwrap().user.email, "a@example.com");
        let bad = Credentials { email: "a@example.com".into(), password: "nope".into() };
        assert!(matches!(store.login(bad).await, Err(StoreError::Rejected(_))));
    }
}
