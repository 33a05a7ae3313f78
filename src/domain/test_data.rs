//! Test data constants for consistent testing
//!
//! This module centralizes the literals shared by unit and integration tests
//! so that expectations and fixtures agree on ids, topics and base times.

/// Scenario base times (wire format)
pub mod bases {
    pub const GENERATOR_BASE: &str = "2024-01-01T12:00:00";
    pub const CUSTOM_BASE: &str = "2026-01-01T12:00:00";
    pub const UNPARSEABLE: &str = "2024-01-01 12:00";
}

/// Subjects the attribution window is keyed on
pub mod users {
    pub const USER_1: &str = "user_1";
    pub const USER_2: &str = "user_2";
    pub const USER_3: &str = "user_3";
}

/// Broker topic names
pub mod topics {
    pub const PAGE_VIEWS: &str = "page_views";
    pub const AD_CLICKS: &str = "ad_clicks";
}

/// Campaign identifiers
pub mod campaigns {
    pub const CAMPAIGN_A: &str = "campaign_A";
    pub const CAMPAIGN_B: &str = "campaign_B";
}

/// Page URLs
pub mod urls {
    pub const PRODUCT_1: &str = "https://example.com/product1";
    pub const PRODUCT_2: &str = "https://example.com/product2";
}

/// Wire schema keys
pub mod schema {
    pub const PAGE_VIEW_KEYS: &[&str] = &["event_id", "event_time", "url", "user_id"];
    pub const AD_CLICK_KEYS: &[&str] = &["campaign_id", "click_id", "event_time", "user_id"];
    pub const SCHEDULING_ONLY_KEY: &str = "processing_time";
}

/// Reference model of the join engine's lateness check
///
/// The engine keeps, per partition, the maximum event time seen on each
/// stream. Once both streams have been seen, an event is late when its
/// event time is before the lower of the two maxima minus the allowed
/// lateness. The maxima are updated before the check. This model assumes
/// every event lands on the same partition.
pub mod join_watermark {
    use chrono::{NaiveDateTime, TimeDelta};

    use crate::domain::events::{Channel, ScheduledEvent};

    pub const ALLOWED_LATENESS_MINUTES: i64 = 2;

    /// Business ids the engine drops as late when `events` arrive in order.
    pub fn late_events<'a>(events: impl IntoIterator<Item = &'a ScheduledEvent>) -> Vec<String> {
        let allowed_lateness = TimeDelta::minutes(ALLOWED_LATENESS_MINUTES);
        let mut max_click: Option<NaiveDateTime> = None;
        let mut max_view: Option<NaiveDateTime> = None;
        let mut late = Vec::new();

        for event in events {
            let time = event.event_time().into_inner();
            let seen = match event.channel() {
                Channel::AdClicks => &mut max_click,
                Channel::PageViews => &mut max_view,
            };
            *seen = Some(seen.map_or(time, |max| max.max(time)));

            if let (Some(click), Some(view)) = (max_click, max_view) {
                if time < click.min(view) - allowed_lateness {
                    late.push(event.business_id().to_string());
                }
            }
        }

        late
    }
}
