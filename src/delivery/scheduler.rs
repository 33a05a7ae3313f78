//! Sequential replay of a timeline through a sink
//!
//! Events go out one at a time. Each publish must be acknowledged before the
//! next one starts, and a fixed pacing delay separates consecutive events so
//! the consumer observes them in distinct processing instants. There is no
//! per-message retry: the first failure aborts the run, since skipping an
//! event would silently change what the engine sees.

use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ReplaySettings, TopicSettings};
use crate::delivery::timeline::Timeline;
use crate::domain::events::{Channel, ScheduledEvent};
use crate::domain::identifiers::ReplayRunId;
use crate::error::{Error, Result};
use crate::infrastructure::log_messages::delivery as messages;
use crate::infrastructure::sink::{DeliveryAck, EventSink, SinkError};

/// Timing of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPolicy {
    pub pacing: Duration,
    pub ack_timeout: Duration,
}

impl ReplayPolicy {
    /// No pacing; useful when the receiver does not care about wall-clock
    /// separation.
    pub fn immediate(ack_timeout: Duration) -> Self {
        Self {
            pacing: Duration::ZERO,
            ack_timeout,
        }
    }
}

impl From<&ReplaySettings> for ReplayPolicy {
    fn from(settings: &ReplaySettings) -> Self {
        Self {
            pacing: settings.pacing(),
            ack_timeout: settings.ack_timeout(),
        }
    }
}

/// One acknowledged event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub index: usize,
    pub business_id: String,
    pub channel: Channel,
    pub routing_key: String,
    pub ack: DeliveryAck,
}

/// Outcome of a completed replay
#[derive(Debug, Clone)]
pub struct ReplayReport {
    run_id: ReplayRunId,
    receipts: Vec<DeliveryReceipt>,
}

impl ReplayReport {
    pub fn run_id(&self) -> &ReplayRunId {
        &self.run_id
    }

    pub fn receipts(&self) -> &[DeliveryReceipt] {
        &self.receipts
    }

    pub fn delivered(&self) -> usize {
        self.receipts.len()
    }

    pub fn delivered_on(&self, channel: Channel) -> usize {
        self.receipts.iter().filter(|r| r.channel == channel).count()
    }
}

pub struct DeliveryScheduler<S> {
    sink: S,
    topics: TopicSettings,
    policy: ReplayPolicy,
}

impl<S: EventSink> DeliveryScheduler<S> {
    pub fn new(sink: S, topics: TopicSettings, policy: ReplayPolicy) -> Self {
        Self {
            sink,
            topics,
            policy,
        }
    }

    /// Delivers every event of `timeline` in order, then closes the sink.
    ///
    /// On failure, whatever the sink still holds unacknowledged is discarded
    /// before it is closed, so the failed event and everything after it stay
    /// undelivered. The returned error carries the index of the failed event
    /// and of the last acknowledged one.
    #[instrument(skip_all, fields(run_id = %run_id, events = timeline.len()))]
    pub async fn replay(self, run_id: ReplayRunId, timeline: Timeline) -> Result<ReplayReport> {
        let outcome = self.deliver_all(&timeline).await;
        if outcome.is_err() {
            if let Err(error) = self.sink.abort().await {
                warn!(%error, "{}", messages::ABORT_FAILED);
            }
        }

        let closed = self.sink.close().await;
        match (outcome, closed) {
            (Ok(receipts), Ok(())) => Ok(ReplayReport { run_id, receipts }),
            (Ok(receipts), Err(source)) => Err(Error::Close {
                delivered: receipts.len(),
                source,
            }),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(close_error)) => {
                warn!(error = %close_error, "closing sink after failed replay");
                Err(error)
            }
        }
    }

    async fn deliver_all(&self, timeline: &Timeline) -> Result<Vec<DeliveryReceipt>> {
        let mut receipts = Vec::with_capacity(timeline.len());

        for (index, event) in timeline.iter().enumerate() {
            if index > 0 && !self.policy.pacing.is_zero() {
                tokio::time::sleep(self.policy.pacing).await;
            }

            match self.deliver(index, event).await {
                Ok(receipt) => receipts.push(receipt),
                Err(source) => {
                    let last_acknowledged = receipts.last().map(|r: &DeliveryReceipt| r.index);
                    error!(
                        index,
                        business_id = event.business_id(),
                        ?last_acknowledged,
                        error = %source,
                        "{}",
                        messages::PUBLISH_FAILED
                    );
                    return Err(Error::Publish {
                        index,
                        business_id: event.business_id().to_string(),
                        last_acknowledged,
                        source,
                    });
                }
            }
        }

        Ok(receipts)
    }

    async fn deliver(
        &self,
        index: usize,
        event: &ScheduledEvent,
    ) -> std::result::Result<DeliveryReceipt, SinkError> {
        let channel = event.channel();
        let message = event
            .to_outbound(self.topics.topic_for(channel))
            .map_err(|e| SinkError::Rejected(e.to_string()))?;
        let routing_key = message.routing_key_lossy();

        info!(
            index,
            topic = %message.topic,
            key = %routing_key,
            business_id = event.business_id(),
            event_time = %event.event_time().to_wire(),
            processing_time = %event.processing_time(),
            "{}",
            messages::PUBLISHING
        );

        let ack = tokio::time::timeout(self.policy.ack_timeout, self.sink.publish(&message))
            .await
            .map_err(|_| SinkError::Timeout(self.policy.ack_timeout))??;

        debug!(
            index,
            partition = ?ack.partition,
            offset = ?ack.offset,
            "{}",
            messages::ACKNOWLEDGED
        );
        Ok(DeliveryReceipt {
            index,
            business_id: event.business_id().to_string(),
            channel,
            routing_key,
            ack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ScenarioCatalog;
    use crate::domain::events::OutboundMessage;
    use crate::infrastructure::sink::RecordingSink;
    use async_trait::async_trait;

    fn timeline(names: &[&str]) -> Timeline {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let sequences: Vec<_> = catalog
            .resolve(names)
            .unwrap()
            .into_iter()
            .map(|s| s.default_events().unwrap())
            .collect();
        Timeline::merge(sequences)
    }

    fn scheduler<S: EventSink>(sink: S) -> DeliveryScheduler<S> {
        DeliveryScheduler::new(
            sink,
            TopicSettings::default(),
            ReplayPolicy::immediate(Duration::from_secs(1)),
        )
    }

    fn click_ids(sink: &RecordingSink) -> Vec<String> {
        sink.messages()
            .iter()
            .map(|m| {
                let json: serde_json::Value = serde_json::from_slice(&m.payload).unwrap();
                json.get("click_id")
                    .or_else(|| json.get("event_id"))
                    .and_then(|v| v.as_str())
                    .unwrap()
                    .to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn two_clicks_then_pageview_publishes_in_processing_order() {
        let sink = RecordingSink::new();
        let report = scheduler(sink.clone())
            .replay(ReplayRunId::generate(), timeline(&["two_clicks_then_pageview"]))
            .await
            .unwrap();

        assert_eq!(report.delivered(), 3);
        assert_eq!(report.delivered_on(Channel::AdClicks), 2);
        assert_eq!(click_ids(&sink), vec!["click_S1_1", "click_S1_2", "pv_S1_1"]);

        let messages = sink.messages();
        assert!(messages.iter().all(|m| &m.routing_key[..] == b"user_1"));
        assert_eq!(messages[0].topic, "ad_clicks");
        assert_eq!(messages[2].topic, "page_views");
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn failure_aborts_without_sending_the_rest() {
        let sink = RecordingSink::failing_at(1);
        let result = scheduler(sink.clone())
            .replay(ReplayRunId::generate(), timeline(&["latest_click_wins"]))
            .await;

        match result {
            Err(Error::Publish {
                index,
                business_id,
                last_acknowledged,
                ..
            }) => {
                assert_eq!(index, 1);
                assert_eq!(business_id, "click_3b");
                assert_eq!(last_acknowledged, Some(0));
            }
            other => panic!("expected publish failure, got {other:?}"),
        }
        assert_eq!(sink.len(), 1);
        assert!(sink.is_aborted());
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn completed_replay_is_not_aborted() {
        let sink = RecordingSink::new();
        scheduler(sink.clone())
            .replay(ReplayRunId::generate(), timeline(&["on_time_attribution"]))
            .await
            .unwrap();

        assert!(!sink.is_aborted());
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn failure_on_first_event_has_no_acknowledged_index() {
        let sink = RecordingSink::failing_at(0);
        let result = scheduler(sink)
            .replay(ReplayRunId::generate(), timeline(&["no_candidate_click"]))
            .await;

        assert!(matches!(
            result,
            Err(Error::Publish {
                index: 0,
                last_acknowledged: None,
                ..
            })
        ));
    }

    struct SilentSink;

    #[async_trait]
    impl EventSink for SilentSink {
        async fn publish(
            &self,
            _message: &OutboundMessage,
        ) -> std::result::Result<DeliveryAck, SinkError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(DeliveryAck::default())
        }

        async fn close(&self) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        async fn abort(&self) -> std::result::Result<(), SinkError> {
            Ok(())
        }
    }

    /// Queues every message like a producer would and acknowledges all but
    /// one; `close` delivers whatever is still queued.
    #[derive(Clone, Default)]
    struct BufferingSink {
        stall_at: usize,
        state: std::sync::Arc<parking_lot::Mutex<Buffered>>,
    }

    #[derive(Default)]
    struct Buffered {
        published: usize,
        queued: Vec<String>,
        delivered: Vec<String>,
    }

    impl BufferingSink {
        fn stalling_at(stall_at: usize) -> Self {
            Self {
                stall_at,
                ..Self::default()
            }
        }

        fn delivered(&self) -> Vec<String> {
            self.state.lock().delivered.clone()
        }
    }

    #[async_trait]
    impl EventSink for BufferingSink {
        async fn publish(
            &self,
            message: &OutboundMessage,
        ) -> std::result::Result<DeliveryAck, SinkError> {
            let json: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();
            let id = json
                .get("click_id")
                .or_else(|| json.get("event_id"))
                .and_then(|v| v.as_str())
                .unwrap()
                .to_string();

            let index = {
                let mut state = self.state.lock();
                let index = state.published;
                state.published += 1;
                state.queued.push(id);
                index
            };
            if index == self.stall_at {
                std::future::pending::<()>().await;
            }

            let mut state = self.state.lock();
            let acked = state.queued.remove(0);
            state.delivered.push(acked);
            Ok(DeliveryAck::default())
        }

        async fn close(&self) -> std::result::Result<(), SinkError> {
            let mut state = self.state.lock();
            let pending = std::mem::take(&mut state.queued);
            state.delivered.extend(pending);
            Ok(())
        }

        async fn abort(&self) -> std::result::Result<(), SinkError> {
            self.state.lock().queued.clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn timed_out_event_is_not_delivered_by_close() {
        let sink = BufferingSink::stalling_at(1);
        let scheduler = DeliveryScheduler::new(
            sink.clone(),
            TopicSettings::default(),
            ReplayPolicy::immediate(Duration::from_millis(20)),
        );
        let result = scheduler
            .replay(ReplayRunId::generate(), timeline(&["latest_click_wins"]))
            .await;

        match result {
            Err(Error::Publish {
                index,
                business_id,
                source: SinkError::Timeout(_),
                ..
            }) => {
                assert_eq!(index, 1);
                assert_eq!(sink.delivered(), vec!["click_3a"]);
                assert!(!sink.delivered().contains(&business_id));
            }
            other => panic!("expected publish timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_acknowledgement_times_out() {
        let scheduler = DeliveryScheduler::new(
            SilentSink,
            TopicSettings::default(),
            ReplayPolicy::immediate(Duration::from_millis(20)),
        );
        let result = scheduler
            .replay(ReplayRunId::generate(), timeline(&["on_time_attribution"]))
            .await;

        assert!(matches!(
            result,
            Err(Error::Publish {
                source: SinkError::Timeout(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn pacing_separates_consecutive_events() {
        let sink = RecordingSink::new();
        let policy = ReplayPolicy {
            pacing: Duration::from_millis(20),
            ack_timeout: Duration::from_secs(1),
        };
        let started = std::time::Instant::now();
        DeliveryScheduler::new(sink, TopicSettings::default(), policy)
            .replay(ReplayRunId::generate(), timeline(&["latest_click_wins"]))
            .await
            .unwrap();

        // Three events, two gaps
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
