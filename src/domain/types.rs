//! Validated value types for the event timeline
//!
//! Every identifier that ends up on the wire is a newtype validated at
//! construction, so a scenario can never author an event the join engine
//! would reject for malformed keys. The two clocks of an event (business
//! time and delivery time) are distinct types with no conversion
//! between them.

use chrono::{NaiveDateTime, TimeDelta};
use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// Wire format of `event_time`, matching the join engine's parser.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The subject an attribution window is keyed on (the `user_id`).
///
/// Also used verbatim as the broker routing key.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct EntityKey(String);

impl EntityKey {
    /// Routing key bytes for keyed partitioning.
    pub fn routing_key(&self) -> bytes::Bytes {
        bytes::Bytes::copy_from_slice(self.as_ref().as_bytes())
    }
}

/// Identifier of a page view (`event_id` on the wire)
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200, regex = r"^[A-Za-z0-9][A-Za-z0-9_.-]*$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct PageViewId(String);

/// Identifier of an ad click (`click_id` on the wire)
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200, regex = r"^[A-Za-z0-9][A-Za-z0-9_.-]*$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct ClickId(String);

/// Campaign an ad click belongs to
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct CampaignId(String);

/// URL of a viewed page
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 2048, regex = r"^https?://[^\s]+$"),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct PageUrl(String);

/// Registry name of a scenario
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 100, regex = r"^[a-z][a-z0-9_]*$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct ScenarioName(String);

/// Business timestamp: when the real-world action happened.
///
/// Serialized as a zone-less ISO-8601 string (`2024-01-01T12:05:00`).
#[nutype(derive(
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
    Display
))]
pub struct EventTime(NaiveDateTime);

impl EventTime {
    /// Renders the timestamp in the wire format.
    pub fn to_wire(&self) -> String {
        self.into_inner().format(EVENT_TIME_FORMAT).to_string()
    }
}

/// Delivery timestamp: when the event is handed to the sink.
///
/// Only ever used to order a timeline; it never leaves the process.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display
))]
pub struct ProcessingTime(NaiveDateTime);

/// Anchor from which a scenario derives both of its clocks.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display
))]
pub struct ScenarioBase(NaiveDateTime);

impl ScenarioBase {
    /// Business time `offset` after the base.
    pub fn event_at(&self, offset: TimeDelta) -> EventTime {
        EventTime::new(self.into_inner() + offset)
    }

    /// Delivery time `offset` after the base.
    pub fn processed_at(&self, offset: TimeDelta) -> ProcessingTime {
        ProcessingTime::new(self.into_inner() + offset)
    }

    /// Parses a base in the wire format.
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, EVENT_TIME_FORMAT).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_data::{bases, users};

    #[test]
    fn entity_key_rejects_blank_values() {
        assert!(EntityKey::try_new(String::new()).is_err());
        assert!(EntityKey::try_new("   ".to_string()).is_err());
        let key = EntityKey::try_new(format!(" {} ", users::USER_1)).unwrap();
        assert_eq!(key.as_ref(), users::USER_1);
    }

    #[test]
    fn routing_key_is_the_raw_user_id() {
        let key = EntityKey::try_new(users::USER_1.to_string()).unwrap();
        assert_eq!(&key.routing_key()[..], b"user_1");
    }

    #[test]
    fn identifiers_reject_whitespace_inside() {
        assert!(ClickId::try_new("click 1".to_string()).is_err());
        assert!(PageViewId::try_new("pv_S4_late".to_string()).is_ok());
    }

    #[test]
    fn page_url_requires_http_scheme() {
        assert!(PageUrl::try_new("https://example.com/p1".to_string()).is_ok());
        assert!(PageUrl::try_new("example.com/p1".to_string()).is_err());
    }

    #[test]
    fn scenario_names_are_normalised() {
        let name = ScenarioName::try_new(" Late_Click_Dropped ".to_string()).unwrap();
        assert_eq!(name.as_ref(), "late_click_dropped");
        assert!(ScenarioName::try_new("late-click".to_string()).is_err());
    }

    #[test]
    fn both_clocks_derive_independently_from_the_base() {
        let base = ScenarioBase::parse(bases::GENERATOR_BASE).unwrap();
        let event_time = base.event_at(TimeDelta::minutes(12));
        let processing_time = base.processed_at(TimeDelta::minutes(16));

        assert_eq!(event_time.to_wire(), "2024-01-01T12:12:00");
        assert_eq!(
            processing_time.into_inner() - event_time.into_inner(),
            TimeDelta::minutes(4)
        );
    }

    #[test]
    fn event_time_serializes_without_zone() {
        let base = ScenarioBase::parse(bases::CUSTOM_BASE).unwrap();
        let json = serde_json::to_string(&base.event_at(TimeDelta::minutes(5))).unwrap();
        assert_eq!(json, "\"2026-01-01T12:05:00\"");
    }
}
