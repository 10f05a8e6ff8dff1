//! Storefront domain: value objects, cart/catalog rules and events
pub mod aggregates;
pub mod events;
pub mod value_objects;
