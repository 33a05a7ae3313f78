//! Scenarios checked against the join engine's metrics counters
//!
//! These all reuse `user_1` and are meant to be replayed one at a time (or
//! back-to-back) against a running engine while watching its dashboard.
//! Events are delivered one second apart in the order listed.

use chrono::TimeDelta;

use crate::domain::events::{AdClick, PageView, ScheduledEvent};
use crate::domain::scenario::{
    CounterExpectation::{Exactly, Increase},
    EngineCounter, Expectation,
};
use crate::domain::types::ScenarioBase;
use crate::error::Result;

const USER: &str = "user_1";

fn minutes(n: i64) -> TimeDelta {
    TimeDelta::minutes(n)
}

fn slot(n: i64) -> TimeDelta {
    TimeDelta::seconds(n)
}

/// Two clicks, then the view they compete for.
pub fn two_clicks_then_pageview(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(0)), "campaign_A", "click_S1_1")?,
            base.processed_at(slot(0)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(5)), "campaign_B", "click_S1_2")?,
            base.processed_at(slot(1)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(10)),
                "https://example.com/p1",
                "pv_S1_1",
            )?,
            base.processed_at(slot(2)),
        ),
    ])
}

pub fn two_clicks_then_pageview_expectation() -> Expectation {
    Expectation::new("both clicks stored before the view, latest attributed at emit time")
        .attributes("pv_S1_1", "click_S1_2")
        .counter(EngineCounter::ClicksReceived, Increase(2))
        .counter(EngineCounter::PageViewsReceived, Increase(1))
        .counter(EngineCounter::PageViewsEmitted, Increase(1))
        .counter(EngineCounter::PageViewsUpdated, Increase(0))
}

/// The view first, then two clicks that each improve its attribution.
pub fn pageview_then_two_clicks(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(10)),
                "https://example.com/p2",
                "pv_S2_1",
            )?,
            base.processed_at(slot(0)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(0)), "campaign_A", "click_S2_1")?,
            base.processed_at(slot(1)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(5)), "campaign_B", "click_S2_2")?,
            base.processed_at(slot(2)),
        ),
    ])
}

pub fn pageview_then_two_clicks_expectation() -> Expectation {
    Expectation::new("emitted with null attribution, then updated by each better click")
        .attributes("pv_S2_1", "click_S2_2")
        .counter(EngineCounter::PageViewsEmitted, Increase(1))
        .counter(EngineCounter::PageViewsUpdated, Increase(2))
}

/// A newer click advances the watermark, an older one arrives too late.
///
/// The join watermark needs the view stream too, so the drop only happens
/// when a view was already seen for the partition (e.g. replayed after
/// `two_clicks_then_pageview`).
pub fn late_click_dropped(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(10)), "campaign_NEW", "click_S3_new")?,
            base.processed_at(slot(0)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(3)), "campaign_OLD", "click_S3_old")?,
            base.processed_at(slot(1)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(11)),
                "https://example.com/p3",
                "pv_S3_1",
            )?,
            base.processed_at(slot(2)),
        ),
    ])
}

pub fn late_click_dropped_expectation() -> Expectation {
    Expectation::new("old click falls behind the watermark and is dropped")
        .attributes("pv_S3_1", "click_S3_new")
        .dropped_late("click_S3_old")
        .counter(EngineCounter::ClicksReceived, Increase(2))
        .counter(EngineCounter::ClicksDroppedLate, Increase(1))
        .counter(EngineCounter::PageViewsEmitted, Increase(1))
}

/// A view advances the watermark, an older view arrives too late.
///
/// The engine only has a join watermark once it has seen both streams for
/// the partition, so this expects a click stream that already advanced
/// (e.g. replayed after `late_click_dropped`).
pub fn late_pageview_dropped(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(20)),
                "https://example.com/advance",
                "pv_S4_advance",
            )?,
            base.processed_at(slot(0)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(5)),
                "https://example.com/late",
                "pv_S4_late",
            )?,
            base.processed_at(slot(1)),
        ),
    ])
}

pub fn late_pageview_dropped_expectation() -> Expectation {
    Expectation::new("one view emitted, the older one dropped late")
        .dropped_late("pv_S4_late")
        .counter(EngineCounter::PageViewsReceived, Increase(2))
        .counter(EngineCounter::PageViewsDroppedLate, Increase(1))
        .counter(EngineCounter::PageViewsEmitted, Increase(1))
}

/// Reference sequence with exact final counters on a fresh engine.
pub fn metrics_reference(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(10)),
                "https://example.com/ref",
                "pv_REF_1",
            )?,
            base.processed_at(slot(0)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(3)), "campaign_A", "click_REF_1")?,
            base.processed_at(slot(1)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(USER, base.event_at(minutes(5)), "campaign_B", "click_REF_2")?,
            base.processed_at(slot(2)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                USER,
                base.event_at(minutes(12)),
                "https://example.com/ref2",
                "pv_REF_2",
            )?,
            base.processed_at(slot(3)),
        ),
    ])
}

pub fn metrics_reference_expectation() -> Expectation {
    Expectation::new("exact final metrics on a fresh engine")
        .attributes("pv_REF_1", "click_REF_2")
        .attributes("pv_REF_2", "click_REF_2")
        .counter(EngineCounter::ClicksReceived, Exactly(2))
        .counter(EngineCounter::PageViewsReceived, Exactly(2))
        .counter(EngineCounter::PageViewsEmitted, Exactly(2))
        .counter(EngineCounter::PageViewsUpdated, Exactly(2))
        .counter(EngineCounter::ClickStateSize, Exactly(2))
        .counter(EngineCounter::PageViewStateSize, Exactly(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_data::bases;

    fn base() -> ScenarioBase {
        ScenarioBase::parse(bases::CUSTOM_BASE).unwrap()
    }

    #[test]
    fn every_event_targets_the_same_subject() {
        let events = metrics_reference(&base()).unwrap();
        assert!(events.iter().all(|e| e.entity_key().as_ref() == USER));
    }

    #[test]
    fn delivery_slots_are_distinct() {
        let events = pageview_then_two_clicks(&base()).unwrap();
        let mut slots: Vec<_> = events.iter().map(ScheduledEvent::processing_time).collect();
        slots.dedup();
        assert_eq!(slots.len(), events.len());
    }

    #[test]
    fn late_click_is_authored_with_an_older_event_time() {
        let events = late_click_dropped(&base()).unwrap();
        assert!(events[1].event_time() < events[0].event_time());
        assert!(events[1].processing_time() > events[0].processing_time());
    }
}
