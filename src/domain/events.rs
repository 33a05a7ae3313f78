//! Page-view and ad-click events as authored by scenarios
//!
//! A [`ScheduledEvent`] pairs a wire payload with the moment it must be
//! delivered. The payload types carry no delivery time at all, so converting
//! an event into an [`OutboundMessage`] strips scheduling data by
//! construction rather than by filtering keys.

use bytes::Bytes;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::domain::types::{
    CampaignId, ClickId, EntityKey, EventTime, PageUrl, PageViewId, ProcessingTime,
};
use crate::error::{Error, Result};

/// Logical output channel of an event
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[display("page_views")]
    PageViews,
    #[display("ad_clicks")]
    AdClicks,
}

/// A page view: `{user_id, event_time, url, event_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageView {
    pub user_id: EntityKey,
    pub event_time: EventTime,
    pub url: PageUrl,
    pub event_id: PageViewId,
}

impl PageView {
    pub fn try_new(
        user_id: &str,
        event_time: EventTime,
        url: &str,
        event_id: &str,
    ) -> Result<Self> {
        Ok(Self {
            user_id: EntityKey::try_new(user_id.to_string())
                .map_err(|e| Error::invalid_event("user_id", e))?,
            event_time,
            url: PageUrl::try_new(url.to_string()).map_err(|e| Error::invalid_event("url", e))?,
            event_id: PageViewId::try_new(event_id.to_string())
                .map_err(|e| Error::invalid_event("event_id", e))?,
        })
    }
}

/// An ad click: `{user_id, event_time, campaign_id, click_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdClick {
    pub user_id: EntityKey,
    pub event_time: EventTime,
    pub campaign_id: CampaignId,
    pub click_id: ClickId,
}

impl AdClick {
    pub fn try_new(
        user_id: &str,
        event_time: EventTime,
        campaign_id: &str,
        click_id: &str,
    ) -> Result<Self> {
        Ok(Self {
            user_id: EntityKey::try_new(user_id.to_string())
                .map_err(|e| Error::invalid_event("user_id", e))?,
            event_time,
            campaign_id: CampaignId::try_new(campaign_id.to_string())
                .map_err(|e| Error::invalid_event("campaign_id", e))?,
            click_id: ClickId::try_new(click_id.to_string())
                .map_err(|e| Error::invalid_event("click_id", e))?,
        })
    }
}

/// The part of an event that is transmitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum EventPayload {
    PageView(PageView),
    AdClick(AdClick),
}

impl EventPayload {
    pub fn channel(&self) -> Channel {
        match self {
            EventPayload::PageView(_) => Channel::PageViews,
            EventPayload::AdClick(_) => Channel::AdClicks,
        }
    }

    pub fn entity_key(&self) -> &EntityKey {
        match self {
            EventPayload::PageView(view) => &view.user_id,
            EventPayload::AdClick(click) => &click.user_id,
        }
    }

    pub fn event_time(&self) -> EventTime {
        match self {
            EventPayload::PageView(view) => view.event_time,
            EventPayload::AdClick(click) => click.event_time,
        }
    }

    /// View id or click id, for tracing only.
    pub fn business_id(&self) -> &str {
        match self {
            EventPayload::PageView(view) => view.event_id.as_ref(),
            EventPayload::AdClick(click) => click.click_id.as_ref(),
        }
    }
}

/// An event together with the moment it must be delivered
///
/// Two scheduled events are the same event when their business ids match,
/// whatever their clocks or remaining fields.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    payload: EventPayload,
    processing_time: ProcessingTime,
}

impl ScheduledEvent {
    pub fn new(payload: impl Into<EventPayload>, processing_time: ProcessingTime) -> Self {
        Self {
            payload: payload.into(),
            processing_time,
        }
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn processing_time(&self) -> ProcessingTime {
        self.processing_time
    }

    pub fn event_time(&self) -> EventTime {
        self.payload.event_time()
    }

    pub fn channel(&self) -> Channel {
        self.payload.channel()
    }

    pub fn entity_key(&self) -> &EntityKey {
        self.payload.entity_key()
    }

    pub fn business_id(&self) -> &str {
        self.payload.business_id()
    }

    /// The same event delivered `offset` later. Event time is untouched.
    pub fn shifted(&self, offset: TimeDelta) -> Self {
        Self {
            payload: self.payload.clone(),
            processing_time: ProcessingTime::new(self.processing_time.into_inner() + offset),
        }
    }

    /// Builds the message handed to the sink. The delivery time stays behind.
    pub fn to_outbound(&self, topic: &str) -> Result<OutboundMessage> {
        Ok(OutboundMessage {
            channel: self.channel(),
            topic: topic.to_string(),
            routing_key: self.entity_key().routing_key(),
            payload: Bytes::from(serde_json::to_vec(&self.payload)?),
        })
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.business_id() == other.business_id()
    }
}

impl Eq for ScheduledEvent {}

impl Hash for ScheduledEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.business_id().hash(state);
    }
}

/// One keyed message ready for publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: Channel,
    pub topic: String,
    pub routing_key: Bytes,
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Routing key as text, for logs.
    pub fn routing_key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.routing_key).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_data::{bases, campaigns, urls, users};
    use crate::domain::types::ScenarioBase;

    fn base() -> ScenarioBase {
        ScenarioBase::parse(bases::GENERATOR_BASE).unwrap()
    }

    fn late_click() -> ScheduledEvent {
        let click = AdClick::try_new(
            users::USER_2,
            base().event_at(TimeDelta::minutes(12)),
            campaigns::CAMPAIGN_B,
            "click_2",
        )
        .unwrap();
        ScheduledEvent::new(click, base().processed_at(TimeDelta::minutes(16)))
    }

    #[test]
    fn page_view_rejects_empty_user() {
        let result = PageView::try_new(
            "",
            base().event_at(TimeDelta::zero()),
            urls::PRODUCT_1,
            "pv_1",
        );
        assert!(matches!(result, Err(Error::InvalidEvent { .. })));
    }

    #[test]
    fn channel_follows_variant() {
        assert_eq!(late_click().channel(), Channel::AdClicks);
        assert_eq!(Channel::PageViews.to_string(), "page_views");
    }

    #[test]
    fn outbound_payload_matches_click_schema() {
        let message = late_click().to_outbound("ad_clicks").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "user_id": "user_2",
                "event_time": "2024-01-01T12:12:00",
                "campaign_id": "campaign_B",
                "click_id": "click_2",
            })
        );
        assert_eq!(&message.routing_key[..], b"user_2");
        assert_eq!(message.topic, "ad_clicks");
    }

    #[test]
    fn payload_with_processing_time_is_not_a_valid_event() {
        let json = r#"{
            "user_id": "user_1",
            "event_time": "2024-01-01T12:10:00",
            "url": "https://example.com/product1",
            "event_id": "pv_1",
            "processing_time": "2024-01-01T12:10:02"
        }"#;
        assert!(serde_json::from_str::<EventPayload>(json).is_err());
    }

    #[test]
    fn untagged_payload_decodes_back_to_its_variant() {
        let event = late_click();
        let message = event.to_outbound("ad_clicks").unwrap();
        let decoded: EventPayload = serde_json::from_slice(&message.payload).unwrap();
        assert_eq!(&decoded, event.payload());
        assert_eq!(decoded.business_id(), "click_2");
    }

    #[test]
    fn identity_follows_the_business_id() {
        let event = late_click();
        let rescheduled = event.shifted(TimeDelta::minutes(5));
        assert_eq!(rescheduled, event);
        assert_eq!(rescheduled.event_time(), event.event_time());
        assert!(rescheduled.processing_time() > event.processing_time());

        let other = AdClick::try_new(
            users::USER_2,
            base().event_at(TimeDelta::minutes(12)),
            campaigns::CAMPAIGN_B,
            "click_other",
        )
        .unwrap();
        assert_ne!(
            ScheduledEvent::new(other, event.processing_time()),
            event
        );
    }
}
