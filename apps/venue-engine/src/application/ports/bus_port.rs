//! Message bus port.
//!
//! Transport abstraction between the two contexts. Concrete brokers live
//! in the infrastructure layer; the engine ships an in-memory adapter.

use async_trait::async_trait;

use crate::messaging::errors::MessagingError;
use crate::messaging::integration_events::IntegrationEvent;

/// Queue feeding the portfolio context's inbox.
pub const PORTFOLIO_QUEUE: &str = "portfolio-inbox";
/// Queue feeding the trading context's inbox.
pub const TRADING_QUEUE: &str = "trading-inbox";

/// One consumed message awaiting ack or nack.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Broker-assigned tag used to ack or nack this delivery.
    pub tag: u64,
    /// The delivered event.
    pub event: IntegrationEvent,
    /// True when this message was delivered before and requeued.
    pub redelivered: bool,
}

/// Publish/consume abstraction with explicit acknowledgement.
#[async_trait]
pub trait MessageBusPort: Send + Sync {
    /// Publish an event to a queue.
    ///
    /// # Errors
    ///
    /// Returns error if the broker rejects the publish.
    async fn publish(&self, queue: &str, event: &IntegrationEvent) -> Result<(), MessagingError>;

    /// Take up to `limit` pending deliveries from a queue. Taken messages
    /// stay unacknowledged until acked or nacked.
    ///
    /// # Errors
    ///
    /// Returns error if the broker is unavailable.
    async fn consume(&self, queue: &str, limit: usize) -> Result<Vec<Delivery>, MessagingError>;

    /// Acknowledge a delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the tag is unknown or the broker fails.
    async fn ack(&self, delivery_tag: u64) -> Result<(), MessagingError>;

    /// Reject a delivery; `requeue` puts it back at the front of its
    /// queue as a redelivery, otherwise it dead-letters.
    ///
    /// # Errors
    ///
    /// Returns error if the tag is unknown or the broker fails.
    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), MessagingError>;
}
