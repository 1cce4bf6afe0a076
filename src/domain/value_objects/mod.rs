//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self { Self(value) }
        }
    };
}

id_type!(ProductId);
id_type!(ShopId);
id_type!(CartId);
id_type!(CartItemId);
id_type!(OrderId);
id_type!(OrderItemId);
id_type!(
    /// Identifies a marketplace account; customers and shop owners share this space.
    UserId
);

/// Amount in the storefront's single display currency (INR).
///
/// Arithmetic never rounds; only [`format_inr`] rounds, and only for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Mul<Quantity> for Money {
    type Output = Money;
    fn mul(self, qty: Quantity) -> Money { Money(self.0 * Decimal::from(qty.value())) }
}

impl Mul<Decimal> for Money {
    type Output = Money;
    fn mul(self, rate: Decimal) -> Money { Money(self.0 * rate) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&format_inr(*self)) }
}

/// Formats an unrounded amount for display: rupee sign, two decimals, Indian digit grouping.
pub fn format_inr(amount: Money) -> String {
    let rounded = amount.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = if whole.len() <= 3 {
        whole.to_string()
    } else {
        let (head, last3) = whole.split_at(whole.len() - 3);
        let mut pairs: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            pairs.push(t);
            rest = h;
        }
        pairs.push(rest);
        pairs.reverse();
        format!("{},{}", pairs.join(","), last3)
    };

    format!("{}₹{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

/// Line quantity; a cart or order line never holds zero units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::NotPositive(value)); }
        u32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge(value))
    }
    pub fn value(&self) -> u32 { self.0 }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> i64 { i64::from(q.0) }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1, got {0}")]
    NotPositive(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// Free-text delivery address; must contain something other than whitespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShippingAddress(String);

impl ShippingAddress {
    pub fn new(value: impl Into<String>) -> Result<Self, AddressError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(AddressError::Empty); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for ShippingAddress {
    type Error = AddressError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<ShippingAddress> for String {
    fn from(a: ShippingAddress) -> String { a.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("shipping address is required")]
    Empty,
}

/// How the customer pays. Only cash on delivery is accepted today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod", alias = "COD")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::CashOnDelivery => "cod" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_rejects_non_positive() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-3), Err(QuantityError::NotPositive(-3)));
        assert_eq!(Quantity::new(4).unwrap().value(), 4);
    }

    #[test]
    fn test_quantity_deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().value(), 2);
    }

    #[test]
    fn test_money_times_quantity() {
        let price = Money::new(dec!(12.50));
        assert_eq!((price * Quantity::new(3).unwrap()).amount(), dec!(37.50));
    }

    #[test]
    fn test_shipping_address_trims() {
        assert_eq!(ShippingAddress::new("  "), Err(AddressError::Empty));
        assert_eq!(ShippingAddress::new(" 12 MG Road ").unwrap().as_str(), "12 MG Road");
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(Money::new(dec!(126))), "₹126.00");
        assert_eq!(format_inr(Money::new(dec!(64.8))), "₹64.80");
        assert_eq!(format_inr(Money::new(dec!(1234567.005))), "₹12,34,567.01");
        assert_eq!(format_inr(Money::new(dec!(-1500))), "-₹1,500.00");
    }

    #[test]
    fn test_payment_method_wire_value() {
        assert_eq!(serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(), "\"cod\"");
    }
}
