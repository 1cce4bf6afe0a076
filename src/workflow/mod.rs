//! Storefront workflows.
//!
//! Each operation fetches what it needs, issues its writes in order, and
//! reloads the affected collection before returning. Failures are converted
//! to [`StorefrontError`](crate::StorefrontError) at the step that issued the
//! call and are never retried.

use std::fmt;
use std::sync::Arc;

use crate::domain::events::{DomainEvent, EventSink};
use crate::store::Storefront;

pub mod account;
pub mod cart;
pub mod checkout;
pub mod fulfilment;
pub mod seller_view;
pub mod vendor;

pub use cart::{CartLine, CartSnapshot, CartView};
pub use checkout::{CheckoutReceipt, CheckoutRequest};
pub use fulfilment::StatusChange;
pub use seller_view::{display_order, CustomerOrder, ReceivedOrder, ReceivedOrders, SellerOrderView};
pub use vendor::{ProductDetail, ShopDetail, VendorCatalog};

#[derive(Clone)]
pub struct Marketplace {
    store: Arc<dyn Storefront>,
    events: Arc<dyn EventSink>,
}

impl Marketplace {
    pub fn new(store: Arc<dyn Storefront>, events: Arc<dyn EventSink>) -> Self { Self { store, events } }

    pub fn store(&self) -> &dyn Storefront { &*self.store }

    async fn raise(&self, event: DomainEvent) {
        tracing::debug!(event = event.name(), "raising domain event");
        self.events.publish(event).await;
    }
}

impl fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Marketplace").finish_non_exhaustive() }
}
