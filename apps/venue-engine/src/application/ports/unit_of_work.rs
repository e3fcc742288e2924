//! Unit-of-work ports.
//!
//! A commit persists the mutated aggregates and appends the integration
//! events raised by the mutation to the context's outbox as one atomic
//! operation. The in-memory adapters model this with a single lock; a
//! database adapter would use one transaction.

use async_trait::async_trait;

use crate::domain::portfolio::Portfolio;
use crate::domain::trading::Order;
use crate::messaging::errors::MessagingError;
use crate::messaging::integration_events::IntegrationEvent;

/// Atomic commit for the trading context.
#[async_trait]
pub trait TradingUnitOfWork: Send + Sync {
    /// Persist `orders` and stage `events` for publication, atomically.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is persisted then.
    async fn commit(
        &self,
        orders: &[Order],
        events: &[IntegrationEvent],
    ) -> Result<(), MessagingError>;
}

/// Atomic commit for the portfolio context.
#[async_trait]
pub trait PortfolioUnitOfWork: Send + Sync {
    /// Persist `portfolio` and stage `events` for publication, atomically.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is persisted then.
    async fn commit(
        &self,
        portfolio: &Portfolio,
        events: &[IntegrationEvent],
    ) -> Result<(), MessagingError>;
}
