//! Log message constants for the harness
//!
//! Messages are kept in one place so replay logs read the same across
//! components and can be grepped reliably by the operators of a test run.

/// Process startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting clickstream harness";
    pub const SCENARIOS_RESOLVED: &str = "Scenarios resolved";
    pub const EXPECTATION: &str = "Expected outcome";
    pub const DRY_RUN: &str = "Dry run: events are recorded, nothing is sent to a broker";
    pub const FINISHED: &str = "Replay finished";
}

/// Broker connection messages
pub mod broker {
    pub const CONNECTING: &str = "Connecting to broker";
    pub const CONNECTED: &str = "Broker reachable";
    pub const NOT_READY: &str = "Broker not ready, retrying";
    pub const GAVE_UP: &str = "Broker unreachable, giving up";
    pub const FLUSHING: &str = "Flushing producer";
    pub const PURGING: &str = "Purging unacknowledged messages";
}

/// Per-event delivery messages
pub mod delivery {
    pub const TIMELINE_BUILT: &str = "Delivery timeline built";
    pub const PUBLISHING: &str = "Publishing event";
    pub const ACKNOWLEDGED: &str = "Event acknowledged";
    pub const PUBLISH_FAILED: &str = "Publish failed, aborting replay";
    pub const ABORT_FAILED: &str = "Discarding pending messages failed";
}

/// Configuration messages
pub mod configuration {
    pub const LOADED: &str = "Configuration loaded";
    pub const BOOTSTRAP_OVERRIDE: &str = "Bootstrap servers overridden from command line";
    pub const BASE_OVERRIDE: &str = "Scenario base time overridden";
}
