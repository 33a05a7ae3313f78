//! Domain types for the clickstream harness
//!
//! Events, their two clocks, and the scenarios that produce them. Nothing
//! in here performs I/O.

pub mod catalog;
pub mod events;
pub mod identifiers;
pub mod scenario;
pub mod scenarios;
pub mod test_data;
pub mod types;

pub use catalog::ScenarioCatalog;
pub use events::{AdClick, Channel, EventPayload, OutboundMessage, PageView, ScheduledEvent};
pub use scenario::{Expectation, Scenario};
pub use types::{EntityKey, EventTime, ProcessingTime, ScenarioBase};
