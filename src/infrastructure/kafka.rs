//! Kafka implementation of [`EventSink`]
//!
//! The producer is configured for strict per-key ordering: idempotent,
//! `acks=all`, and a single in-flight request per connection. Combined with
//! the scheduler awaiting every acknowledgement, the broker log preserves
//! the delivery timeline exactly.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer, PurgeConfig};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::KafkaSettings;
use crate::domain::events::OutboundMessage;
use crate::error::{Error, Result};
use crate::infrastructure::log_messages::broker as messages;
use crate::infrastructure::sink::{DeliveryAck, EventSink, SinkError};

/// Retry schedule for the initial connection only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectBackoff {
    pub max_attempts: u32,
    pub initial: Duration,
}

impl ConnectBackoff {
    pub fn from_settings(settings: &KafkaSettings) -> Self {
        Self {
            max_attempts: settings.connect_max_attempts.max(1),
            initial: settings.connect_initial_backoff(),
        }
    }

    /// Delay after the given failed attempt (1 based), doubling each time.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial.saturating_mul(1 << exponent)
    }
}

pub struct KafkaSink {
    producer: FutureProducer,
    message_timeout: Duration,
}

impl std::fmt::Debug for KafkaSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSink")
            .field("message_timeout", &self.message_timeout)
            .finish_non_exhaustive()
    }
}

fn producer_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.bootstrap_servers)
        .set("client.id", &settings.client_id)
        .set("acks", "all")
        .set("enable.idempotence", "true")
        .set("max.in.flight.requests.per.connection", "1")
        .set("partitioner", "murmur2_random")
        .set("message.timeout.ms", settings.message_timeout_ms.to_string());
    config
}

impl KafkaSink {
    /// Creates the producer and waits until the cluster answers a metadata
    /// request, backing off between attempts.
    #[instrument(skip(settings), fields(bootstrap = %settings.bootstrap_servers))]
    pub async fn connect(settings: &KafkaSettings) -> Result<Self> {
        let backoff = ConnectBackoff::from_settings(settings);
        let message_timeout = settings.message_timeout();
        let mut attempt = 0;

        info!("{}", messages::CONNECTING);
        loop {
            attempt += 1;
            match Self::try_connect(settings, message_timeout).await {
                Ok(producer) => {
                    info!(attempt, "{}", messages::CONNECTED);
                    return Ok(Self {
                        producer,
                        message_timeout,
                    });
                }
                Err(source) if attempt >= backoff.max_attempts => {
                    warn!(attempt, error = %source, "{}", messages::GAVE_UP);
                    return Err(Error::Connectivity {
                        attempts: attempt,
                        source,
                    });
                }
                Err(error) => {
                    let delay = backoff.delay_after(attempt);
                    warn!(attempt, ?delay, %error, "{}", messages::NOT_READY);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_connect(
        settings: &KafkaSettings,
        probe_timeout: Duration,
    ) -> std::result::Result<FutureProducer, SinkError> {
        let producer: FutureProducer = producer_config(settings).create()?;
        let probe = producer.clone();
        // fetch_metadata blocks the calling thread
        tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(None, Timeout::After(probe_timeout))
                .map(|_| ())
        })
        .await
        .map_err(|e| SinkError::Rejected(format!("metadata probe aborted: {e}")))??;
        Ok(producer)
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    async fn publish(
        &self,
        message: &OutboundMessage,
    ) -> std::result::Result<DeliveryAck, SinkError> {
        let record = FutureRecord::to(&message.topic)
            .key(&message.routing_key[..])
            .payload(&message.payload[..]);

        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(self.message_timeout))
            .await
            .map_err(|(error, _)| SinkError::Kafka(error))?;

        debug!(partition, offset, topic = %message.topic, "delivered");
        Ok(DeliveryAck {
            partition: Some(partition),
            offset: Some(offset),
        })
    }

    async fn close(&self) -> std::result::Result<(), SinkError> {
        info!("{}", messages::FLUSHING);
        let producer = self.producer.clone();
        let timeout = self.message_timeout;
        // flush blocks until the queue drains or the timeout expires
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| SinkError::Rejected(format!("flush aborted: {e}")))??;
        Ok(())
    }

    async fn abort(&self) -> std::result::Result<(), SinkError> {
        warn!("{}", messages::PURGING);
        self.producer.purge(PurgeConfig::default().queue().inflight());
        Ok(())
    }
}
