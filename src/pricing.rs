//! Cart pricing
//!
//! Subtotal, tax, shipping, and total for a set of cart lines against a
//! product snapshot. Pure: no I/O, no hidden state, safe to call repeatedly
//! while products are still loading.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::aggregates::{CartItem, Product};
use crate::domain::value_objects::{CartId, Money, ProductId};

/// Products keyed by id, as resolved so far.
pub type ProductMap = HashMap<ProductId, Product>;

/// Flat tax applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Orders strictly above this subtotal ship free (₹50).
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Shipping charged at or below the threshold (₹99).
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(99, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CartTotals {
    pub fn from_subtotal(subtotal: Money) -> Self {
        let tax = tax(subtotal);
        let shipping = shipping(subtotal);
        Self { subtotal, tax, shipping, total: subtotal + tax + shipping }
    }

    /// All zeros; what an empty cart prices to.
    pub fn empty() -> Self { Self::default() }

    pub fn ships_free(&self) -> bool { self.shipping.is_zero() }
}

/// Prices the lines of `scope` (or every line when `None`).
///
/// Lines whose product is not in `products` contribute nothing.
pub fn compute_totals(items: &[CartItem], products: &ProductMap, scope: Option<CartId>) -> CartTotals {
    let lines: Vec<&CartItem> = items.iter().filter(|i| i.in_cart(scope)).collect();
    if lines.is_empty() {
        return CartTotals::empty();
    }
    CartTotals::from_subtotal(subtotal(lines, products))
}

pub fn subtotal<'a>(items: impl IntoIterator<Item = &'a CartItem>, products: &ProductMap) -> Money {
    items
        .into_iter()
        .map(|item| products.get(&item.product_id).map_or(Money::ZERO, |p| p.price * item.quantity))
        .sum()
}

pub fn tax(subtotal: Money) -> Money { subtotal * TAX_RATE }

pub fn shipping(subtotal: Money) -> Money {
    if subtotal.amount() > FREE_SHIPPING_THRESHOLD { Money::ZERO } else { Money::new(FLAT_SHIPPING_FEE) }
}

/// True when every line in scope has its product loaded, i.e. the totals are final.
pub fn is_pricing_complete(items: &[CartItem], products: &ProductMap, scope: Option<CartId>) -> bool {
    items.iter().filter(|i| i.in_cart(scope)).all(|i| products.contains_key(&i.product_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{CartItemId, Quantity, ShopId};
    use rust_decimal_macros::dec;

    fn product(id: i64, price: Decimal) -> Product {
        Product {
            id: ProductId(id), shop_id: ShopId(1), name: format!("p{id}"), description: String::new(),
            price: Money::new(price), stock: 10, category: String::new(), brand: None, sku: None, images: vec![],
        }
    }

    fn item(id: i64, cart: i64, product: i64, qty: i64) -> CartItem {
        CartItem { id: CartItemId(id), cart_id: CartId(cart), product_id: ProductId(product), quantity: Quantity::new(qty).unwrap() }
    }

    fn catalog(products: Vec<Product>) -> ProductMap { products.into_iter().map(|p| (p.id, p)).collect() }

    #[test]
    fn test_small_cart_pays_shipping() {
        let products = catalog(vec![product(1, dec!(10)), product(2, dec!(5))]);
        let items = [item(1, 1, 1, 2), item(2, 1, 2, 1)];
        let totals = compute_totals(&items, &products, Some(CartId(1)));
        assert_eq!(totals.subtotal.amount(), dec!(25));
        assert_eq!(totals.tax.amount(), dec!(2));
        assert_eq!(totals.shipping.amount(), dec!(99));
        assert_eq!(totals.total.amount(), dec!(126));
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let products = catalog(vec![product(1, dec!(20))]);
        let totals = compute_totals(&[item(1, 1, 1, 3)], &products, None);
        assert_eq!(totals.subtotal.amount(), dec!(60));
        assert_eq!(totals.tax.amount(), dec!(4.8));
        assert!(totals.ships_free());
        assert_eq!(totals.total.amount(), dec!(64.8));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(shipping(Money::new(dec!(50))).amount(), dec!(99));
        assert_eq!(shipping(Money::new(dec!(50.01))).amount(), dec!(0));
        assert_eq!(shipping(Money::ZERO).amount(), dec!(99));
    }

    #[test]
    fn test_empty_items_price_to_zero() {
        let totals = compute_totals(&[], &ProductMap::new(), None);
        assert_eq!(totals, CartTotals::empty());
        let products = catalog(vec![product(1, dec!(20))]);
        assert_eq!(compute_totals(&[item(1, 2, 1, 1)], &products, Some(CartId(9))), CartTotals::empty());
    }

    #[test]
    fn test_missing_products_contribute_zero() {
        let products = catalog(vec![product(1, dec!(10))]);
        let items = [item(1, 1, 1, 1), item(2, 1, 42, 5)];
        let totals = compute_totals(&items, &products, None);
        assert_eq!(totals.subtotal.amount(), dec!(10));
        assert!(!is_pricing_complete(&items, &products, None));
        assert!(is_pricing_complete(&items[..1], &products, None));
    }

    #[test]
    fn test_scope_restricts_lines() {
        let products = catalog(vec![product(1, dec!(10)), product(2, dec!(30))]);
        let items = [item(1, 1, 1, 1), item(2, 2, 2, 2)];
        assert_eq!(compute_totals(&items, &products, Some(CartId(1))).subtotal.amount(), dec!(10));
        assert_eq!(compute_totals(&items, &products, Some(CartId(2))).subtotal.amount(), dec!(60));
        assert_eq!(compute_totals(&items, &products, None).subtotal.amount(), dec!(70));
    }

    #[test]
    fn test_totals_hold_for_many_subtotals() {
        let products = catalog((1..=7).map(|i| product(i, Decimal::new(i * 337, 2))).collect());
        for qty in 1..=25 {
            let items: Vec<_> = (1..=7).map(|p| item(p, 1, p, qty)).collect();
            let expected: Decimal = (1..=7).map(|p| Decimal::new(p * 337, 2) * Decimal::from(qty)).sum();
            let totals = compute_totals(&items, &products, None);
            assert_eq!(totals.subtotal.amount(), expected);
            assert_eq!(totals.tax.amount(), expected * dec!(0.08));
            assert_eq!(totals.shipping.amount(), if expected > dec!(50) { dec!(0) } else { dec!(99) });
            assert_eq!(totals.total, totals.subtotal + totals.tax + totals.shipping);
            assert_eq!(totals, compute_totals(&items, &products, None));
        }
    }
}
