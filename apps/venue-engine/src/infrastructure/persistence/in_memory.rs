//! In-memory persistence adapters.
//!
//! Each store keeps its aggregates and its outbox behind a single lock so
//! that a unit-of-work commit lands atomically: either the aggregates and
//! the integration events are all visible, or none are.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{PortfolioUnitOfWork, TradingUnitOfWork};
use crate::domain::portfolio::aggregate::Portfolio;
use crate::domain::portfolio::errors::PortfolioError;
use crate::domain::portfolio::repository::PortfolioRepository;
use crate::domain::shared::{EventId, OrderId, Symbol, Timestamp, UserId};
use crate::domain::trading::aggregate::Order;
use crate::domain::trading::errors::TradingError;
use crate::domain::trading::repository::OrderRepository;
use crate::messaging::errors::MessagingError;
use crate::messaging::inbox::InboxStore;
use crate::messaging::integration_events::IntegrationEvent;
use crate::messaging::outbox::{OutboxMessage, OutboxStore};

#[derive(Debug, Default)]
struct OrderStoreInner {
    orders: HashMap<String, Order>,
    outbox: Vec<OutboxMessage>,
}

/// In-memory order store backing `OrderRepository`, `OutboxStore`, and
/// `TradingUnitOfWork`.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: Mutex<OrderStoreInner>,
}

impl InMemoryOrderStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of orders in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().orders.is_empty()
    }

    /// Add an order to the store (for test setup).
    pub fn add(&self, order: Order) {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.insert(order.id().to_string(), order);
    }

    /// Number of outbox messages, sent or not.
    #[must_use]
    pub fn outbox_len(&self) -> usize {
        self.inner.lock().unwrap().outbox.len()
    }

    /// Snapshot of the outbox, sent or not (for test inspection).
    #[must_use]
    pub fn outbox_snapshot(&self) -> Vec<OutboxMessage> {
        self.inner.lock().unwrap().outbox.clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> Result<(), TradingError> {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.insert(order.id().to_string(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, TradingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.orders.get(id.as_str()).cloned())
    }

    async fn find_open_by_symbol(&self, symbol: &Symbol) -> Result<Vec<Order>, TradingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .values()
            .filter(|o| o.status().is_open() && o.symbol() == symbol)
            .cloned()
            .collect())
    }

    async fn find_open(&self) -> Result<Vec<Order>, TradingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .orders
            .values()
            .filter(|o| o.status().is_open())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OutboxStore for InMemoryOrderStore {
    async fn fetch_unsent(
        &self,
        limit: usize,
        max_attempts: u32,
    ) -> Result<Vec<OutboxMessage>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .outbox
            .iter()
            .filter(|m| m.sent_at.is_none() && m.attempts < max_attempts)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, event_id: &EventId) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        mark_sent(&mut inner.outbox, event_id)
    }

    async fn record_failure(&self, event_id: &EventId) -> Result<u32, MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        record_failure(&mut inner.outbox, event_id)
    }

    async fn find_stuck(&self, max_attempts: u32) -> Result<Vec<OutboxMessage>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        Ok(find_stuck(&inner.outbox, max_attempts))
    }
}

#[async_trait]
impl TradingUnitOfWork for InMemoryOrderStore {
    async fn commit(
        &self,
        orders: &[Order],
        events: &[IntegrationEvent],
    ) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        for order in orders {
            inner.orders.insert(order.id().to_string(), order.clone());
        }
        for event in events {
            inner.outbox.push(OutboxMessage::new(event.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PortfolioStoreInner {
    portfolios: HashMap<String, Portfolio>,
    outbox: Vec<OutboxMessage>,
}

/// In-memory portfolio store backing `PortfolioRepository`, `OutboxStore`,
/// and `PortfolioUnitOfWork`.
#[derive(Debug, Default)]
pub struct InMemoryPortfolioStore {
    inner: Mutex<PortfolioStoreInner>,
}

impl InMemoryPortfolioStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a portfolio to the store (for test setup).
    pub fn add(&self, portfolio: Portfolio) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .portfolios
            .insert(portfolio.user_id().to_string(), portfolio);
    }

    /// Number of outbox messages, sent or not.
    #[must_use]
    pub fn outbox_len(&self) -> usize {
        self.inner.lock().unwrap().outbox.len()
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryPortfolioStore {
    async fn save(&self, portfolio: &Portfolio) -> Result<(), PortfolioError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .portfolios
            .insert(portfolio.user_id().to_string(), portfolio.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Portfolio>, PortfolioError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.portfolios.get(user_id.as_str()).cloned())
    }
}

#[async_trait]
impl OutboxStore for InMemoryPortfolioStore {
    async fn fetch_unsent(
        &self,
        limit: usize,
        max_attempts: u32,
    ) -> Result<Vec<OutboxMessage>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .outbox
            .iter()
            .filter(|m| m.sent_at.is_none() && m.attempts < max_attempts)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, event_id: &EventId) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        mark_sent(&mut inner.outbox, event_id)
    }

    async fn record_failure(&self, event_id: &EventId) -> Result<u32, MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        record_failure(&mut inner.outbox, event_id)
    }

    async fn find_stuck(&self, max_attempts: u32) -> Result<Vec<OutboxMessage>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        Ok(find_stuck(&inner.outbox, max_attempts))
    }
}

#[async_trait]
impl PortfolioUnitOfWork for InMemoryPortfolioStore {
    async fn commit(
        &self,
        portfolio: &Portfolio,
        events: &[IntegrationEvent],
    ) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .portfolios
            .insert(portfolio.user_id().to_string(), portfolio.clone());
        for event in events {
            inner.outbox.push(OutboxMessage::new(event.clone()));
        }
        Ok(())
    }
}

fn mark_sent(outbox: &mut [OutboxMessage], event_id: &EventId) -> Result<(), MessagingError> {
    let message = outbox
        .iter_mut()
        .find(|m| m.event.id == *event_id)
        .ok_or_else(|| MessagingError::Storage(format!("unknown outbox message: {event_id}")))?;
    message.attempts += 1;
    message.sent_at = Some(Timestamp::now());
    Ok(())
}

fn record_failure(outbox: &mut [OutboxMessage], event_id: &EventId) -> Result<u32, MessagingError> {
    let message = outbox
        .iter_mut()
        .find(|m| m.event.id == *event_id)
        .ok_or_else(|| MessagingError::Storage(format!("unknown outbox message: {event_id}")))?;
    message.attempts += 1;
    Ok(message.attempts)
}

fn find_stuck(outbox: &[OutboxMessage], max_attempts: u32) -> Vec<OutboxMessage> {
    outbox
        .iter()
        .filter(|m| m.is_stuck(max_attempts))
        .cloned()
        .collect()
}

/// In-memory inbox ledger of processed dedupe keys.
#[derive(Debug, Default)]
pub struct InMemoryInboxStore {
    seen: Mutex<HashSet<String>>,
}

impl InMemoryInboxStore {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InboxStore for InMemoryInboxStore {
    async fn seen(&self, dedupe_key: &str) -> Result<bool, MessagingError> {
        Ok(self.seen.lock().unwrap().contains(dedupe_key))
    }

    async fn record(&self, dedupe_key: &str) -> Result<(), MessagingError> {
        self.seen.lock().unwrap().insert(dedupe_key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::shared::{Money, Quantity};
    use crate::domain::trading::aggregate::Order;
    use crate::domain::trading::value_objects::{CancelReason, OrderSide, TimeInForce};
    use crate::messaging::mapper::IntegrationEventMapper;

    fn accepted_order(symbol: &str) -> (Order, IntegrationEvent) {
        let mut order = Order::limit(
            UserId::generate(),
            Symbol::new(symbol),
            OrderSide::Buy,
            Quantity::new(dec!(10)),
            Money::new(dec!(100)),
            TimeInForce::Gtc,
        )
        .unwrap();
        let accepted = order.accept().unwrap();
        let event = IntegrationEventMapper::from_trading(&accepted).unwrap();
        (order, event)
    }

    #[tokio::test]
    async fn commit_persists_orders_and_outbox_together() {
        let store = InMemoryOrderStore::new();
        let (order, event) = accepted_order("AAPL");

        store.commit(&[order.clone()], &[event]).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.outbox_len(), 1);
        let found = store.find_by_id(order.id()).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn find_open_by_symbol_filters_status_and_symbol() {
        let store = InMemoryOrderStore::new();
        store.add(accepted_order("AAPL").0);
        store.add(accepted_order("MSFT").0);
        let mut done = accepted_order("AAPL").0;
        let _ = done.cancel(CancelReason::user_requested()).unwrap();
        store.add(done);

        let symbol = Symbol::new("AAPL");
        let open = store.find_open_by_symbol(&symbol).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(store.find_open().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn outbox_failure_counting_and_stuck_detection() {
        let store = InMemoryOrderStore::new();
        let (_, event) = accepted_order("AAPL");
        let id = event.id.clone();
        store.commit(&[], &[event]).await.unwrap();

        for _ in 0..3 {
            store.record_failure(&id).await.unwrap();
        }
        assert!(store.fetch_unsent(10, 3).await.unwrap().is_empty());
        assert_eq!(store.find_stuck(3).await.unwrap().len(), 1);

        store.mark_sent(&id).await.unwrap();
        assert!(store.find_stuck(3).await.unwrap().is_empty());

        // The successful publication counts as an attempt too
        let message = &store.outbox_snapshot()[0];
        assert!(message.sent_at.is_some());
        assert_eq!(message.attempts, 4);
    }

    #[tokio::test]
    async fn inbox_store_records_keys() {
        let inbox = InMemoryInboxStore::new();
        assert!(!inbox.seen("k").await.unwrap());
        inbox.record("k").await.unwrap();
        assert!(inbox.seen("k").await.unwrap());
    }
}
