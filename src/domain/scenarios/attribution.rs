//! Attribution edge cases, one subject per scenario
//!
//! Each scenario isolates one behaviour of the windowed join for its own
//! user, so the six can be merged into a single run without interfering.
//! Times are offsets from the scenario base; the processing offsets are
//! what the scheduler orders on.

use chrono::TimeDelta;

use crate::domain::events::{AdClick, PageView, ScheduledEvent};
use crate::domain::scenario::Expectation;
use crate::domain::types::ScenarioBase;
use crate::error::Result;

fn at(minutes: i64, seconds: i64) -> TimeDelta {
    TimeDelta::minutes(minutes) + TimeDelta::seconds(seconds)
}

/// Click delivered before its page view.
pub fn on_time_attribution(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new("user_1", base.event_at(at(5, 0)), "campaign_A", "click_1")?,
            base.processed_at(at(5, 1)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                "user_1",
                base.event_at(at(10, 0)),
                "https://example.com/product1",
                "pv_1",
            )?,
            base.processed_at(at(10, 2)),
        ),
    ])
}

pub fn on_time_attribution_expectation() -> Expectation {
    Expectation::new("click delivered before the view").attributes("pv_1", "click_1")
}

/// The click happened first but is delivered after the view.
///
/// Authored click-first on purpose: delivery order comes from the
/// processing offsets only.
pub fn out_of_order_in_window(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new("user_2", base.event_at(at(12, 0)), "campaign_B", "click_2")?,
            base.processed_at(at(16, 0)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                "user_2",
                base.event_at(at(15, 0)),
                "https://example.com/product2",
                "pv_2",
            )?,
            base.processed_at(at(15, 1)),
        ),
    ])
}

pub fn out_of_order_in_window_expectation() -> Expectation {
    Expectation::new("view delivered first, late click still inside the window")
        .attributes("pv_2", "click_2")
}

/// Two clicks inside the window; the later business time wins.
pub fn latest_click_wins(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new("user_3", base.event_at(at(20, 0)), "campaign_C", "click_3a")?,
            base.processed_at(at(20, 1)),
        ),
        ScheduledEvent::new(
            AdClick::try_new("user_3", base.event_at(at(25, 0)), "campaign_D", "click_3b")?,
            base.processed_at(at(25, 1)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                "user_3",
                base.event_at(at(30, 0)),
                "https://example.com/product3",
                "pv_3",
            )?,
            base.processed_at(at(30, 2)),
        ),
    ])
}

pub fn latest_click_wins_expectation() -> Expectation {
    Expectation::new("two clicks in the window, latest event time wins")
        .attributes("pv_3", "click_3b")
}

/// Click 35 minutes before the view, outside the 30 minute window.
pub fn click_outside_window(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new("user_4", base.event_at(at(35, 0)), "campaign_E", "click_4")?,
            base.processed_at(at(35, 1)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                "user_4",
                base.event_at(at(70, 0)),
                "https://example.com/product4",
                "pv_4",
            )?,
            base.processed_at(at(70, 2)),
        ),
    ])
}

pub fn click_outside_window_expectation() -> Expectation {
    Expectation::new("click older than the attribution window").unattributed("pv_4")
}

/// Click delivered ten minutes after it happened, once the join watermark
/// for its partition has moved past its event time.
///
/// The engine's watermark is the lower of the two streams' maximum event
/// times minus two minutes, so both streams have to advance first: `pv_5`
/// moves the view side to 12:45 and `click_5_advance` moves the click side
/// to 12:46. `click_5_advance` happened after `pv_5` and is never a
/// candidate for it.
pub fn click_beyond_allowed_lateness(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![
        ScheduledEvent::new(
            AdClick::try_new("user_5", base.event_at(at(40, 0)), "campaign_F", "click_5")?,
            base.processed_at(at(50, 0)),
        ),
        ScheduledEvent::new(
            PageView::try_new(
                "user_5",
                base.event_at(at(45, 0)),
                "https://example.com/product5",
                "pv_5",
            )?,
            base.processed_at(at(45, 2)),
        ),
        ScheduledEvent::new(
            AdClick::try_new(
                "user_5",
                base.event_at(at(46, 0)),
                "campaign_F",
                "click_5_advance",
            )?,
            base.processed_at(at(46, 1)),
        ),
    ])
}

pub fn click_beyond_allowed_lateness_expectation() -> Expectation {
    Expectation::new("click arrives behind the join watermark and is discarded by the engine")
        .dropped_late("click_5")
        .unattributed("pv_5")
}

/// A page view for a user that never clicked.
pub fn no_candidate_click(base: &ScenarioBase) -> Result<Vec<ScheduledEvent>> {
    Ok(vec![ScheduledEvent::new(
        PageView::try_new(
            "user_6",
            base.event_at(at(80, 0)),
            "https://example.com/product6",
            "pv_6",
        )?,
        base.processed_at(at(80, 1)),
    )])
}

pub fn no_candidate_click_expectation() -> Expectation {
    Expectation::new("no click for this user, emitted with null attribution").unattributed("pv_6")
}
