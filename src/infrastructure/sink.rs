//! Sink abstraction between the scheduler and a message broker
//!
//! The scheduler only needs "publish one keyed message and tell me when it
//! is durable". [`RecordingSink`] is the in-memory implementation used for
//! dry runs and tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::events::OutboundMessage;

/// Sink failures
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("No acknowledgement within {0:?}")]
    Timeout(Duration),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Sink already closed")]
    Closed,
}

/// Broker acknowledgement of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryAck {
    pub partition: Option<i32>,
    pub offset: Option<i64>,
}

/// Destination of outbound messages
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes one message and resolves once it is acknowledged.
    async fn publish(&self, message: &OutboundMessage) -> Result<DeliveryAck, SinkError>;

    /// Flushes anything buffered and releases the connection.
    async fn close(&self) -> Result<(), SinkError>;

    /// Drops anything queued or in flight that has not been acknowledged.
    ///
    /// Called after a failed publish so that a following `close` cannot
    /// deliver the failed message behind the caller's back.
    async fn abort(&self) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<OutboundMessage>,
    by_key: BTreeMap<Bytes, Vec<usize>>,
    fail_at: Option<usize>,
    closed: bool,
    aborted: bool,
}

/// In-memory sink that keeps every accepted message in arrival order
///
/// Clones share the same record, so a test can keep a handle while the
/// scheduler consumes another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects the message at `index` (zero based) and every
    /// message after it.
    pub fn failing_at(index: usize) -> Self {
        let sink = Self::new();
        sink.inner.lock().fail_at = Some(index);
        sink
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.inner.lock().messages.clone()
    }

    /// Messages sharing `routing_key`, in arrival order.
    pub fn messages_for_key(&self, routing_key: &[u8]) -> Vec<OutboundMessage> {
        let recorded = self.inner.lock();
        recorded
            .by_key
            .get(routing_key)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| recorded.messages[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().messages.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.lock().aborted
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, message: &OutboundMessage) -> Result<DeliveryAck, SinkError> {
        let mut recorded = self.inner.lock();
        if recorded.closed {
            return Err(SinkError::Closed);
        }
        let index = recorded.messages.len();
        if recorded.fail_at.is_some_and(|fail_at| index >= fail_at) {
            return Err(SinkError::Rejected(format!(
                "recording sink configured to fail at message {index}"
            )));
        }

        recorded.messages.push(message.clone());
        recorded
            .by_key
            .entry(message.routing_key.clone())
            .or_default()
            .push(index);

        Ok(DeliveryAck {
            partition: Some(0),
            offset: i64::try_from(index).ok(),
        })
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.inner.lock().closed = true;
        Ok(())
    }

    // Nothing is ever pending here: a message is recorded or rejected.
    async fn abort(&self) -> Result<(), SinkError> {
        self.inner.lock().aborted = true;
        Ok(())
    }
}
