//! Market data feed ports.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::shared::Symbol;
use crate::domain::trading::value_objects::{QuoteSnapshot, TradePrint};

/// Feed adapter failures.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The upstream feed is unreachable or refused the request.
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    /// The subscription was closed by the upstream.
    #[error("feed subscription closed: {0}")]
    Closed(String),
}

/// Pull-based quote source.
#[async_trait]
pub trait QuoteFeedPort: Send + Sync {
    /// Current quote for a symbol; `None` when the feed has nothing for it.
    ///
    /// # Errors
    ///
    /// Returns error if the feed is unavailable.
    async fn get(&self, symbol: &Symbol) -> Result<Option<QuoteSnapshot>, FeedError>;
}

/// Push-based tape source.
#[async_trait]
pub trait TradeFeedPort: Send + Sync {
    /// Subscribe to the stream of trade prints.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription cannot be established.
    async fn subscribe(&self) -> Result<mpsc::Receiver<TradePrint>, FeedError>;
}
