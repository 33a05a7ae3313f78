//! Identifier of a replay run
//!
//! Every run gets a UUID v7 so log lines from consecutive runs against the
//! same engine can be told apart and sorted by start time.

use nutype::nutype;
use uuid::Uuid;

/// Unique identifier for one replay run
#[nutype(derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct ReplayRunId(Uuid);

impl ReplayRunId {
    pub fn generate() -> Self {
        // Uuid::now_v7() generates a time-ordered UUID
        Self::new(Uuid::now_v7())
    }
}

impl Default for ReplayRunId {
    fn default() -> Self {
        Self::generate()
    }
}
