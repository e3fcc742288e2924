//! Transactional outbox.
//!
//! Integration events are appended to the outbox in the same unit of work
//! as the aggregate mutation that raised them; this publisher drains the
//! outbox to the bus afterwards. Delivery is at-least-once: a crash after
//! publish but before `mark_sent` republishes, and the consumer's inbox
//! dedupe collapses the duplicate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::ports::MessageBusPort;
use crate::domain::shared::{EventId, Timestamp};

use super::errors::MessagingError;
use super::integration_events::IntegrationEvent;

/// An integration event staged for publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// The event to publish.
    pub event: IntegrationEvent,
    /// When the message was appended.
    pub created_at: Timestamp,
    /// When the message was published; `None` until then. Sent is terminal.
    pub sent_at: Option<Timestamp>,
    /// Publication attempts so far.
    pub attempts: u32,
}

impl OutboxMessage {
    /// Stage an event for publication.
    #[must_use]
    pub fn new(event: IntegrationEvent) -> Self {
        Self {
            event,
            created_at: Timestamp::now(),
            sent_at: None,
            attempts: 0,
        }
    }

    /// True once the configured attempt budget is exhausted.
    #[must_use]
    pub const fn is_stuck(&self, max_attempts: u32) -> bool {
        self.sent_at.is_none() && self.attempts >= max_attempts
    }
}

/// Store backing one context's outbox.
///
/// Appending happens through the context's unit of work so it shares the
/// transaction with the aggregate write; this trait covers the publisher
/// side only.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Unsent messages in append order, excluding stuck ones.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn fetch_unsent(
        &self,
        limit: usize,
        max_attempts: u32,
    ) -> Result<Vec<OutboxMessage>, MessagingError>;

    /// Mark a message published. Terminal.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    async fn mark_sent(&self, event_id: &EventId) -> Result<(), MessagingError>;

    /// Record a failed publication attempt; returns the new attempt count.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    async fn record_failure(&self, event_id: &EventId) -> Result<u32, MessagingError>;

    /// Messages that exhausted their attempt budget. Kept forever for
    /// operators; never deleted and never re-polled.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_stuck(&self, max_attempts: u32) -> Result<Vec<OutboxMessage>, MessagingError>;
}

/// Outbox publisher configuration.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Messages drained per tick.
    pub batch_size: usize,
    /// Attempts before a message counts as stuck.
    pub max_attempts: u32,
    /// Delay between ticks.
    pub poll_interval: Duration,
    /// Upper bound on a single bus publish.
    pub publish_timeout: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_attempts: 10,
            poll_interval: Duration::from_millis(200),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// Drains one context's outbox to the bus.
pub struct OutboxPublisher {
    store: Arc<dyn OutboxStore>,
    bus: Arc<dyn MessageBusPort>,
    queue: String,
    config: OutboxConfig,
}

impl OutboxPublisher {
    /// Create a publisher draining `store` into `queue`.
    #[must_use]
    pub fn new(
        store: Arc<dyn OutboxStore>,
        bus: Arc<dyn MessageBusPort>,
        queue: impl Into<String>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            store,
            bus,
            queue: queue.into(),
            config,
        }
    }

    /// Run until cancelled. Tick failures are logged and the loop keeps
    /// going.
    pub async fn run(self, cancel: CancellationToken) {
        info!(queue = %self.queue, "outbox publisher started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
            if let Err(error) = self.tick().await {
                error!(queue = %self.queue, %error, "outbox tick failed");
            }
        }
        info!(queue = %self.queue, "outbox publisher stopped");
    }

    /// Drain one batch; returns the number of messages published.
    ///
    /// Failures are isolated per message: a failed publish records the
    /// attempt and moves on to the next message.
    ///
    /// # Errors
    ///
    /// Returns error if the store itself fails.
    pub async fn tick(&self) -> Result<usize, MessagingError> {
        let batch = self
            .store
            .fetch_unsent(self.config.batch_size, self.config.max_attempts)
            .await?;
        let mut published = 0;

        for message in batch {
            let event_id = message.event.id.clone();
            let result = match tokio::time::timeout(
                self.config.publish_timeout,
                self.bus.publish(&self.queue, &message.event),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(MessagingError::Timeout(format!(
                    "publish of event {event_id}"
                ))),
            };

            match result {
                Ok(()) => {
                    self.store.mark_sent(&event_id).await?;
                    debug!(event_id = %event_id, queue = %self.queue, "event published");
                    published += 1;
                }
                Err(error) => {
                    let attempts = self.store.record_failure(&event_id).await?;
                    if attempts >= self.config.max_attempts {
                        warn!(
                            event_id = %event_id,
                            attempts,
                            %error,
                            "outbox message exhausted its attempts and is stuck"
                        );
                    } else {
                        warn!(event_id = %event_id, attempts, %error, "publish failed, will retry");
                    }
                }
            }
        }

        Ok(published)
    }

    /// Stuck messages for operator inspection.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn stuck(&self) -> Result<Vec<OutboxMessage>, MessagingError> {
        self.store.find_stuck(self.config.max_attempts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Delivery;
    use crate::domain::shared::EventId;
    use crate::messaging::integration_events::EventSource;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    fn event(id: &str) -> IntegrationEvent {
        IntegrationEvent {
            id: EventId::new(id),
            event_type: "trading.order.accepted".to_string(),
            source: EventSource::Trading,
            subject: "ord-1".to_string(),
            occurred_at: Timestamp::now(),
            data: serde_json::json!({}),
            schema_version: 1,
            dedupe_key: format!("trading.order.accepted:{id}"),
        }
    }

    struct TestStore {
        messages: Mutex<Vec<OutboxMessage>>,
    }

    impl TestStore {
        fn with(events: Vec<IntegrationEvent>) -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(events.into_iter().map(OutboxMessage::new).collect()),
            })
        }
    }

    #[async_trait]
    impl OutboxStore for TestStore {
        async fn fetch_unsent(
            &self,
            limit: usize,
            max_attempts: u32,
        ) -> Result<Vec<OutboxMessage>, MessagingError> {
            Ok(self
                .messages
                .lock()
                .await
                .iter()
                .filter(|m| m.sent_at.is_none() && m.attempts < max_attempts)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn mark_sent(&self, event_id: &EventId) -> Result<(), MessagingError> {
            let mut messages = self.messages.lock().await;
            let message = messages
                .iter_mut()
                .find(|m| m.event.id == *event_id)
                .ok_or_else(|| MessagingError::Storage("missing message".to_string()))?;
            message.sent_at = Some(Timestamp::now());
            message.attempts += 1;
            Ok(())
        }

        async fn record_failure(&self, event_id: &EventId) -> Result<u32, MessagingError> {
            let mut messages = self.messages.lock().await;
            let message = messages
                .iter_mut()
                .find(|m| m.event.id == *event_id)
                .ok_or_else(|| MessagingError::Storage("missing message".to_string()))?;
            message.attempts += 1;
            Ok(message.attempts)
        }

        async fn find_stuck(
            &self,
            max_attempts: u32,
        ) -> Result<Vec<OutboxMessage>, MessagingError> {
            Ok(self
                .messages
                .lock()
                .await
                .iter()
                .filter(|m| m.is_stuck(max_attempts))
                .cloned()
                .collect())
        }
    }

    struct TestBus {
        published: AtomicUsize,
        fail: AtomicBool,
    }

    impl TestBus {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                published: AtomicUsize::new(0),
                fail: AtomicBool::new(fail),
            })
        }
    }

    #[async_trait]
    impl MessageBusPort for TestBus {
        async fn publish(
            &self,
            _queue: &str,
            _event: &IntegrationEvent,
        ) -> Result<(), MessagingError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MessagingError::Bus("broker unavailable".to_string()));
            }
            self.published.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn consume(
            &self,
            _queue: &str,
            _limit: usize,
        ) -> Result<Vec<Delivery>, MessagingError> {
            Ok(Vec::new())
        }

        async fn ack(&self, _delivery_tag: u64) -> Result<(), MessagingError> {
            Ok(())
        }

        async fn nack(&self, _delivery_tag: u64, _requeue: bool) -> Result<(), MessagingError> {
            Ok(())
        }
    }

    fn publisher(store: Arc<TestStore>, bus: Arc<TestBus>, max_attempts: u32) -> OutboxPublisher {
        OutboxPublisher::new(
            store,
            bus,
            "portfolio-inbox",
            OutboxConfig {
                max_attempts,
                ..OutboxConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn tick_publishes_and_marks_sent() {
        let store = TestStore::with(vec![event("evt-1"), event("evt-2")]);
        let bus = TestBus::new(false);

        let published = publisher(Arc::clone(&store), Arc::clone(&bus), 10)
            .tick()
            .await
            .unwrap();

        assert_eq!(published, 2);
        assert_eq!(bus.published.load(Ordering::SeqCst), 2);
        assert!(
            store
                .messages
                .lock()
                .await
                .iter()
                .all(|m| m.sent_at.is_some())
        );
    }

    #[tokio::test]
    async fn sent_messages_are_not_republished() {
        let store = TestStore::with(vec![event("evt-1")]);
        let bus = TestBus::new(false);
        let publisher = publisher(Arc::clone(&store), Arc::clone(&bus), 10);

        publisher.tick().await.unwrap();
        let second = publisher.tick().await.unwrap();

        assert_eq!(second, 0);
        assert_eq!(bus.published.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_count_attempts_until_stuck() {
        let store = TestStore::with(vec![event("evt-1")]);
        let bus = TestBus::new(true);
        let publisher = publisher(Arc::clone(&store), Arc::clone(&bus), 3);

        for _ in 0..3 {
            assert_eq!(publisher.tick().await.unwrap(), 0);
        }

        // Exhausted: no longer polled, surfaced as stuck, never deleted
        assert_eq!(publisher.tick().await.unwrap(), 0);
        let messages = store.messages.lock().await;
        assert_eq!(messages[0].attempts, 3);
        drop(messages);
        assert_eq!(publisher.stuck().await.unwrap().len(), 1);

        // Recovery of the bus does not resurrect a stuck message
        bus.fail.store(false, Ordering::SeqCst);
        assert_eq!(publisher.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn one_bad_message_does_not_block_the_batch() {
        // Both fail this tick; both get retried next tick once the bus heals
        let store = TestStore::with(vec![event("evt-1"), event("evt-2")]);
        let bus = TestBus::new(true);
        let publisher = publisher(Arc::clone(&store), Arc::clone(&bus), 10);

        publisher.tick().await.unwrap();
        bus.fail.store(false, Ordering::SeqCst);
        let published = publisher.tick().await.unwrap();

        assert_eq!(published, 2);
    }
}
