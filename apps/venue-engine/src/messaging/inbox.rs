//! Idempotent inbox.
//!
//! The consumer processes each delivery as: dedupe check, handle, record
//! dedupe key, ack — strictly in that order. A crash between handling and
//! recording can only cause redelivery of an already-handled event, never
//! a recorded-but-unhandled one; combined with the outbox's at-least-once
//! delivery this yields effectively exactly-once processing.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::ports::{Delivery, MessageBusPort};

use super::errors::MessagingError;
use super::integration_events::IntegrationEvent;

/// Store of dedupe keys already processed by one context.
#[async_trait]
pub trait InboxStore: Send + Sync {
    /// True if the key was recorded before.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn seen(&self, dedupe_key: &str) -> Result<bool, MessagingError>;

    /// Record a key as processed.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    async fn record(&self, dedupe_key: &str) -> Result<(), MessagingError>;
}

/// How a handler failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Business rule violation. Retrying cannot succeed; the delivery is
    /// dead-lettered immediately.
    #[error("event rejected: {0}")]
    Rejected(String),

    /// Transient failure. The first delivery is requeued once; a failure
    /// on redelivery dead-letters.
    #[error("event handling failed: {0}")]
    Failed(String),
}

/// A consumer-side handler for one or more integration event types.
#[async_trait]
pub trait IntegrationEventHandler: Send + Sync {
    /// Event types this handler owns.
    fn event_types(&self) -> &'static [&'static str];

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns error describing whether the failure is retryable.
    async fn handle(&self, event: &IntegrationEvent) -> Result<(), HandlerError>;
}

/// Static handler registry: an explicit list checked at dispatch time,
/// no reflection.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn IntegrationEventHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    #[must_use]
    pub fn with(mut self, handler: Arc<dyn IntegrationEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Find the handler owning an event type.
    #[must_use]
    pub fn handler_for(&self, event_type: &str) -> Option<&Arc<dyn IntegrationEventHandler>> {
        self.handlers
            .iter()
            .find(|h| h.event_types().contains(&event_type))
    }
}

/// Inbox consumer configuration.
#[derive(Debug, Clone)]
pub struct InboxConfig {
    /// Deliveries consumed per tick.
    pub batch_size: usize,
    /// Delay between ticks.
    pub poll_interval: std::time::Duration,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: std::time::Duration::from_millis(200),
        }
    }
}

/// Consumes one context's inbound queue with dedupe.
pub struct InboxConsumer {
    store: Arc<dyn InboxStore>,
    bus: Arc<dyn MessageBusPort>,
    registry: HandlerRegistry,
    queue: String,
    config: InboxConfig,
}

impl InboxConsumer {
    /// Create a consumer for `queue`.
    #[must_use]
    pub fn new(
        store: Arc<dyn InboxStore>,
        bus: Arc<dyn MessageBusPort>,
        registry: HandlerRegistry,
        queue: impl Into<String>,
        config: InboxConfig,
    ) -> Self {
        Self {
            store,
            bus,
            registry,
            queue: queue.into(),
            config,
        }
    }

    /// Run until cancelled. Tick failures are logged and the loop keeps
    /// going.
    pub async fn run(self, cancel: CancellationToken) {
        info!(queue = %self.queue, "inbox consumer started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
            if let Err(error) = self.tick().await {
                error!(queue = %self.queue, %error, "inbox tick failed");
            }
        }
        info!(queue = %self.queue, "inbox consumer stopped");
    }

    /// Consume one batch; returns the number of deliveries handled (acked
    /// after a successful handler run, duplicates excluded).
    ///
    /// # Errors
    ///
    /// Returns error if the bus or store fails outside per-message
    /// handling.
    pub async fn tick(&self) -> Result<usize, MessagingError> {
        let deliveries = self.bus.consume(&self.queue, self.config.batch_size).await?;
        let mut handled = 0;

        for delivery in deliveries {
            if self.process(&delivery).await? {
                handled += 1;
            }
        }
        Ok(handled)
    }

    /// Process a single delivery; true when the handler ran and the
    /// delivery was acked.
    async fn process(&self, delivery: &Delivery) -> Result<bool, MessagingError> {
        let event = &delivery.event;
        let key = event.dedupe_key.as_str();

        if self.store.seen(key).await? {
            debug!(dedupe_key = %key, "duplicate delivery skipped");
            self.bus.ack(delivery.tag).await?;
            return Ok(false);
        }

        let Some(handler) = self.registry.handler_for(&event.event_type) else {
            warn!(event_type = %event.event_type, "no handler registered, dead-lettering");
            self.bus.nack(delivery.tag, false).await?;
            return Ok(false);
        };

        match handler.handle(event).await {
            Ok(()) => {
                self.store.record(key).await?;
                self.bus.ack(delivery.tag).await?;
                Ok(true)
            }
            Err(HandlerError::Rejected(reason)) => {
                warn!(event_id = %event.id, %reason, "event rejected, dead-lettering");
                self.bus.nack(delivery.tag, false).await?;
                Ok(false)
            }
            Err(HandlerError::Failed(reason)) => {
                if delivery.redelivered {
                    warn!(event_id = %event.id, %reason, "redelivery failed, dead-lettering");
                    self.bus.nack(delivery.tag, false).await?;
                } else {
                    warn!(event_id = %event.id, %reason, "handling failed, requeueing once");
                    self.bus.nack(delivery.tag, true).await?;
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{EventId, Timestamp};
    use crate::messaging::integration_events::EventSource;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn event(id: &str, event_type: &str) -> IntegrationEvent {
        IntegrationEvent {
            id: EventId::new(id),
            event_type: event_type.to_string(),
            source: EventSource::Trading,
            subject: "ord-1".to_string(),
            occurred_at: Timestamp::now(),
            data: serde_json::json!({}),
            schema_version: 1,
            dedupe_key: format!("{event_type}:{id}"),
        }
    }

    #[derive(Default)]
    struct TestInbox {
        keys: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl InboxStore for TestInbox {
        async fn seen(&self, dedupe_key: &str) -> Result<bool, MessagingError> {
            Ok(self.keys.lock().await.contains(dedupe_key))
        }

        async fn record(&self, dedupe_key: &str) -> Result<(), MessagingError> {
            self.keys.lock().await.insert(dedupe_key.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingBus {
        pending: Mutex<Vec<Delivery>>,
        acked: Mutex<Vec<u64>>,
        nacked: Mutex<Vec<(u64, bool)>>,
    }

    #[async_trait]
    impl MessageBusPort for RecordingBus {
        async fn publish(
            &self,
            _queue: &str,
            _event: &IntegrationEvent,
        ) -> Result<(), MessagingError> {
            Ok(())
        }

        async fn consume(
            &self,
            _queue: &str,
            limit: usize,
        ) -> Result<Vec<Delivery>, MessagingError> {
            let mut pending = self.pending.lock().await;
            let take = pending.len().min(limit);
            Ok(pending.drain(..take).collect())
        }

        async fn ack(&self, delivery_tag: u64) -> Result<(), MessagingError> {
            self.acked.lock().await.push(delivery_tag);
            Ok(())
        }

        async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), MessagingError> {
            self.nacked.lock().await.push((delivery_tag, requeue));
            Ok(())
        }
    }

    struct CountingHandler {
        invocations: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                invocations: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl IntegrationEventHandler for CountingHandler {
        fn event_types(&self) -> &'static [&'static str] {
            &["trading.order.filled"]
        }

        async fn handle(&self, _event: &IntegrationEvent) -> Result<(), HandlerError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HandlerError::Failed("downstream unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn consumer(
        bus: Arc<RecordingBus>,
        handler: Arc<CountingHandler>,
        store: Arc<TestInbox>,
    ) -> InboxConsumer {
        InboxConsumer::new(
            store,
            bus,
            HandlerRegistry::new().with(handler),
            "portfolio-inbox",
            InboxConfig::default(),
        )
    }

    fn delivery(tag: u64, event: IntegrationEvent, redelivered: bool) -> Delivery {
        Delivery {
            tag,
            event,
            redelivered,
        }
    }

    #[tokio::test]
    async fn handles_records_and_acks() {
        let bus = Arc::new(RecordingBus::default());
        let handler = CountingHandler::new(false);
        let store = Arc::new(TestInbox::default());
        bus.pending
            .lock()
            .await
            .push(delivery(1, event("evt-1", "trading.order.filled"), false));

        let handled = consumer(Arc::clone(&bus), Arc::clone(&handler), Arc::clone(&store))
            .tick()
            .await
            .unwrap();

        assert_eq!(handled, 1);
        assert_eq!(handler.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(*bus.acked.lock().await, vec![1]);
        assert!(store.seen("trading.order.filled:evt-1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_dedupe_key_is_acked_without_invoking_handler() {
        let bus = Arc::new(RecordingBus::default());
        let handler = CountingHandler::new(false);
        let store = Arc::new(TestInbox::default());
        let consumer = consumer(Arc::clone(&bus), Arc::clone(&handler), store);

        // Two deliveries carrying the same dedupe key
        bus.pending
            .lock()
            .await
            .push(delivery(1, event("evt-1", "trading.order.filled"), false));
        bus.pending
            .lock()
            .await
            .push(delivery(2, event("evt-1", "trading.order.filled"), false));

        consumer.tick().await.unwrap();

        assert_eq!(handler.invocations.load(Ordering::SeqCst), 1);
        // Both acked: the duplicate is consumed, just not handled
        assert_eq!(*bus.acked.lock().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn first_failure_requeues_redelivery_dead_letters() {
        let bus = Arc::new(RecordingBus::default());
        let handler = CountingHandler::new(true);
        let store = Arc::new(TestInbox::default());
        let consumer = consumer(Arc::clone(&bus), Arc::clone(&handler), Arc::clone(&store));

        bus.pending
            .lock()
            .await
            .push(delivery(1, event("evt-1", "trading.order.filled"), false));
        consumer.tick().await.unwrap();
        assert_eq!(*bus.nacked.lock().await, vec![(1, true)]);

        bus.pending
            .lock()
            .await
            .push(delivery(2, event("evt-1", "trading.order.filled"), true));
        consumer.tick().await.unwrap();
        assert_eq!(*bus.nacked.lock().await, vec![(1, true), (2, false)]);

        // Failed handling never records the key
        assert!(!store.seen("trading.order.filled:evt-1").await.unwrap());
    }

    #[tokio::test]
    async fn unroutable_event_is_dead_lettered() {
        let bus = Arc::new(RecordingBus::default());
        let handler = CountingHandler::new(false);
        let store = Arc::new(TestInbox::default());
        bus.pending
            .lock()
            .await
            .push(delivery(1, event("evt-1", "trading.order.unknown"), false));

        consumer(Arc::clone(&bus), Arc::clone(&handler), store)
            .tick()
            .await
            .unwrap();

        assert_eq!(handler.invocations.load(Ordering::SeqCst), 0);
        assert_eq!(*bus.nacked.lock().await, vec![(1, false)]);
    }
}
