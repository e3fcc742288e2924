//! Messaging Layer
//!
//! Integration events, the domain-to-wire mapper, and the transactional
//! outbox / idempotent inbox pair that moves events between contexts.

pub mod errors;
pub mod handlers;
pub mod inbox;
pub mod integration_events;
pub mod mapper;
pub mod outbox;

pub use errors::MessagingError;
pub use handlers::{PortfolioSettlementHandler, SettlementAuditHandler};
pub use inbox::{
    HandlerError, HandlerRegistry, InboxConfig, InboxConsumer, InboxStore, IntegrationEventHandler,
};
pub use integration_events::{EventSource, IntegrationEvent};
pub use mapper::IntegrationEventMapper;
pub use outbox::{OutboxConfig, OutboxMessage, OutboxPublisher, OutboxStore};
