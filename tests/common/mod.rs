//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::TimeDelta;
use clickstream_harness::config::TopicSettings;
use clickstream_harness::delivery::{DeliveryScheduler, ReplayPolicy, ReplayReport, Timeline};
use clickstream_harness::domain::identifiers::ReplayRunId;
use clickstream_harness::domain::test_data::{bases, campaigns, urls};
use clickstream_harness::domain::{AdClick, PageView, ScenarioBase, ScenarioCatalog, ScheduledEvent};
use clickstream_harness::infrastructure::RecordingSink;
use std::time::Duration;

pub fn base() -> ScenarioBase {
    ScenarioBase::parse(bases::GENERATOR_BASE).unwrap()
}

/// A page view or click with explicit offsets from the generator base.
pub fn event(
    user: &str,
    id: &str,
    is_click: bool,
    event_offset_secs: i64,
    processing_offset_secs: i64,
) -> ScheduledEvent {
    let base = base();
    let event_time = base.event_at(TimeDelta::seconds(event_offset_secs));
    let processing_time = base.processed_at(TimeDelta::seconds(processing_offset_secs));
    if is_click {
        let click = AdClick::try_new(user, event_time, campaigns::CAMPAIGN_A, id).unwrap();
        ScheduledEvent::new(click, processing_time)
    } else {
        let view = PageView::try_new(user, event_time, urls::PRODUCT_1, id).unwrap();
        ScheduledEvent::new(view, processing_time)
    }
}

pub fn scenario_timeline(names: &[&str]) -> Timeline {
    let catalog = ScenarioCatalog::builtin().unwrap();
    let sequences: Vec<_> = catalog
        .resolve(names)
        .unwrap()
        .into_iter()
        .map(|scenario| scenario.default_events().unwrap())
        .collect();
    Timeline::compose(sequences)
}

pub async fn replay(sink: RecordingSink, timeline: Timeline) -> ReplayReport {
    DeliveryScheduler::new(
        sink,
        TopicSettings::default(),
        ReplayPolicy::immediate(Duration::from_secs(1)),
    )
    .replay(ReplayRunId::generate(), timeline)
    .await
    .unwrap()
}

/// Business id of a recorded payload (`event_id` or `click_id`).
pub fn business_id(payload: &[u8]) -> String {
    let json: serde_json::Value = serde_json::from_slice(payload).unwrap();
    json.get("click_id")
        .or_else(|| json.get("event_id"))
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string()
}
