//! Application services
//!
//! Wires the scenario catalog, the delivery scheduler and a sink into a
//! single run.

pub mod app;

pub use app::{Application, RunOutcome, RunRequest};
