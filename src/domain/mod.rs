//! Marketplace domain: value objects, aggregates, and events
pub mod value_objects;
pub mod aggregates;
pub mod events;
