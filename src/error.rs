use crate::infrastructure::sink::SinkError;
use thiserror::Error;

/// Harness error types
///
/// Every variant is terminal for a run: a partially delivered timeline would
/// corrupt the oracle for the engine under test.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid event field {field}: {reason}")]
    InvalidEvent { field: String, reason: String },

    #[error("Unknown scenario: {name}")]
    ScenarioNotFound { name: String },

    #[error("Scenario registered twice: {name}")]
    DuplicateScenario { name: String },

    #[error("No broker reachable after {attempts} attempts: {source}")]
    Connectivity {
        attempts: u32,
        #[source]
        source: SinkError,
    },

    #[error(
        "Publish failed at event {index} ({business_id}), \
         last acknowledged index: {last_acknowledged:?}: {source}"
    )]
    Publish {
        index: usize,
        business_id: String,
        last_acknowledged: Option<usize>,
        #[source]
        source: SinkError,
    },

    #[error("Sink failed to close after {delivered} acknowledged events: {source}")]
    Close {
        delivered: usize,
        #[source]
        source: SinkError,
    },
}

impl Error {
    pub fn invalid_event(field: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidEvent {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
