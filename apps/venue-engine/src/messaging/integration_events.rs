//! Integration events crossing the context boundary.
//!
//! Domain events stay inside their bounded context; what travels over the
//! bus is this versioned wire shape, produced by the mapper and persisted
//! in the outbox.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{EventId, Timestamp};

/// The bounded context that published an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Trading context (order lifecycle).
    Trading,
    /// Portfolio context (settlement and funding).
    Portfolio,
}

impl EventSource {
    /// Stable lowercase name, matching the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trading => "trading",
            Self::Portfolio => "portfolio",
        }
    }
}

/// An event as it travels between contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    /// Unique event id.
    pub id: EventId,
    /// Dot-namespaced event type, e.g. `trading.order.accepted`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Publishing context.
    pub source: EventSource,
    /// Aggregate id the event is about.
    pub subject: String,
    /// When the underlying domain event occurred.
    pub occurred_at: Timestamp,
    /// Event payload.
    pub data: serde_json::Value,
    /// Payload schema version.
    pub schema_version: u32,
    /// Deterministic key used for consumer-side deduplication.
    pub dedupe_key: String,
}
