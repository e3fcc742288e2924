//! In-memory market data feeds.
//!
//! Test and demo adapters: quotes are set by hand, trade prints are pushed
//! through a channel the tape pump drains.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{FeedError, QuoteFeedPort, TradeFeedPort};
use crate::domain::shared::Symbol;
use crate::domain::trading::value_objects::{QuoteSnapshot, TradePrint};

/// Quote feed backed by a hand-maintained quote table.
#[derive(Debug, Default)]
pub struct StaticQuoteFeed {
    quotes: Mutex<HashMap<String, QuoteSnapshot>>,
}

impl StaticQuoteFeed {
    /// Create a feed with no quotes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the current quote for its symbol.
    pub fn set(&self, quote: QuoteSnapshot) {
        let mut quotes = self.quotes.lock().unwrap();
        quotes.insert(quote.symbol.as_str().to_string(), quote);
    }

    /// Drop the quote for a symbol, if any.
    pub fn clear(&self, symbol: &Symbol) {
        let mut quotes = self.quotes.lock().unwrap();
        quotes.remove(symbol.as_str());
    }
}

#[async_trait]
impl QuoteFeedPort for StaticQuoteFeed {
    async fn get(&self, symbol: &Symbol) -> Result<Option<QuoteSnapshot>, FeedError> {
        let quotes = self.quotes.lock().unwrap();
        Ok(quotes.get(symbol.as_str()).cloned())
    }
}

/// Trade feed backed by an mpsc channel. Single subscriber.
#[derive(Debug)]
pub struct ChannelTradeFeed {
    sender: mpsc::Sender<TradePrint>,
    receiver: Mutex<Option<mpsc::Receiver<TradePrint>>>,
}

impl ChannelTradeFeed {
    /// Create a feed with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Handle for pushing prints onto the tape.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<TradePrint> {
        self.sender.clone()
    }
}

#[async_trait]
impl TradeFeedPort for ChannelTradeFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<TradePrint>, FeedError> {
        let mut receiver = self.receiver.lock().unwrap();
        receiver
            .take()
            .ok_or_else(|| FeedError::Unavailable("tape already subscribed".to_string()))
    }
}
