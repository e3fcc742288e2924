//! In-memory message bus.
//!
//! Queue-per-name broker with delivery tags, redelivery on requeue, and a
//! dead-letter store for permanently rejected messages. Mirrors the ack
//! semantics the engine expects from a real broker.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{Delivery, MessageBusPort};
use crate::messaging::errors::MessagingError;
use crate::messaging::integration_events::IntegrationEvent;

#[derive(Debug, Clone)]
struct QueuedMessage {
    event: IntegrationEvent,
    delivery_count: u32,
}

#[derive(Debug)]
struct Unacked {
    queue: String,
    message: QueuedMessage,
}

#[derive(Debug, Default)]
struct BusInner {
    queues: HashMap<String, VecDeque<QueuedMessage>>,
    unacked: HashMap<u64, Unacked>,
    dead_letters: Vec<IntegrationEvent>,
    next_tag: u64,
}

/// In-memory implementation of `MessageBusPort`.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    inner: Mutex<BusInner>,
}

impl InMemoryBus {
    /// Create a new bus with no queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending message count for a queue, excluding unacked deliveries.
    #[must_use]
    pub fn pending(&self, queue: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Deliveries taken but neither acked nor nacked.
    #[must_use]
    pub fn unacked(&self) -> usize {
        self.inner.lock().unwrap().unacked.len()
    }

    /// Snapshot of dead-lettered events.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<IntegrationEvent> {
        self.inner.lock().unwrap().dead_letters.clone()
    }
}

#[async_trait]
impl MessageBusPort for InMemoryBus {
    async fn publish(&self, queue: &str, event: &IntegrationEvent) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(QueuedMessage {
                event: event.clone(),
                delivery_count: 0,
            });
        Ok(())
    }

    async fn consume(&self, queue: &str, limit: usize) -> Result<Vec<Delivery>, MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let mut deliveries = Vec::new();
        for _ in 0..limit {
            let Some(message) = inner.queues.get_mut(queue).and_then(VecDeque::pop_front) else {
                break;
            };
            inner.next_tag += 1;
            let tag = inner.next_tag;
            deliveries.push(Delivery {
                tag,
                event: message.event.clone(),
                redelivered: message.delivery_count > 0,
            });
            inner.unacked.insert(
                tag,
                Unacked {
                    queue: queue.to_string(),
                    message,
                },
            );
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery_tag: u64) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .unacked
            .remove(&delivery_tag)
            .map(|_| ())
            .ok_or_else(|| MessagingError::Bus(format!("unknown delivery tag: {delivery_tag}")))
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let unacked = inner
            .unacked
            .remove(&delivery_tag)
            .ok_or_else(|| MessagingError::Bus(format!("unknown delivery tag: {delivery_tag}")))?;
        if requeue {
            let mut message = unacked.message;
            message.delivery_count += 1;
            inner
                .queues
                .entry(unacked.queue)
                .or_default()
                .push_front(message);
        } else {
            inner.dead_letters.push(unacked.message.event);
        }
        Ok(())
    }
}
