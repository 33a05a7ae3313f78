//! Clickstream harness - deterministic test data for a stream-join engine
//!
//! Replays named scenarios of page views and ad clicks into a broker,
//! delivering every event at a controlled processing time so that
//! out-of-order and late arrivals are reproducible run after run.

pub mod application;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::Application;
pub use error::{Error, Result};
