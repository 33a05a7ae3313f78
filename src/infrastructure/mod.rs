//! Infrastructure layer for the harness
//!
//! Broker access and the sink abstraction the scheduler publishes through.

pub mod kafka;
pub mod log_messages;
pub mod sink;

pub use kafka::KafkaSink;
pub use sink::{DeliveryAck, EventSink, RecordingSink, SinkError};
