//! Delivery ordering and replay
//!
//! Scenario outputs are merged into a [`Timeline`] ordered by processing
//! time, then handed to a [`DeliveryScheduler`] that publishes them one by
//! one through an [`EventSink`](crate::infrastructure::sink::EventSink).

pub mod scheduler;
pub mod timeline;

pub use scheduler::{DeliveryReceipt, DeliveryScheduler, ReplayPolicy, ReplayReport};
pub use timeline::Timeline;
