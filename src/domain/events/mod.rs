//! Domain events
//!
//! Cart events are published to NATS (`ecommerce.cart.<kind>`) when a client
//! is configured, and always logged.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::UserId;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    ItemsAdded { user_id: UserId, inventory_ids: Vec<i64>, replaced: bool },
    LineRemoved { user_id: UserId, cart_id: i64 },
    Cleared { user_id: UserId, removed: u64 },
    QuantityChanged { user_id: UserId, cart_id: i64, quantity: i32 },
    CheckedOut { user_id: UserId, lines: usize, units: i64, at: DateTime<Utc> },
}

impl CartEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ItemsAdded { .. } => "items_added",
            Self::LineRemoved { .. } => "line_removed",
            Self::Cleared { .. } => "cleared",
            Self::QuantityChanged { .. } => "quantity_changed",
            Self::CheckedOut { .. } => "checked_out",
        }
    }

    pub fn subject(&self) -> String { format!("ecommerce.cart.{}", self.kind()) }
}

/// Fire-and-forget event sink. Publishing never fails the request.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub async fn publish(&self, event: CartEvent) {
        tracing::debug!(event = event.kind(), "cart event");
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("failed to encode {} event: {}", event.kind(), e);
                return;
            }
        };
        if let Err(e) = nats.publish(event.subject(), payload.into()).await {
            tracing::warn!("failed to publish {} event: {}", event.kind(), e);
        }
    }
}
