use chrono::NaiveDateTime;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::domain::events::Channel;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub kafka: KafkaSettings,
    pub topics: TopicSettings,
    pub replay: ReplaySettings,
    #[serde(default)]
    pub scenario: ScenarioSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub client_id: String,
    pub message_timeout_ms: u64,
    pub connect_max_attempts: u32,
    pub connect_initial_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TopicSettings {
    pub page_views: String,
    pub ad_clicks: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySettings {
    pub pacing_ms: u64,
    pub ack_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScenarioSettings {
    /// Overrides every scenario's own base when set.
    #[serde(default)]
    pub base_time: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Loads defaults, then `default`, `{ENVIRONMENT}` and `local` files
    /// from `dir`, then `CLICKSTREAM_HARNESS__*` environment variables.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let file = |name: &str| File::from(dir.join(name)).required(false);

        let config = Config::builder()
            // Start with default values
            .set_default("kafka.bootstrap_servers", "kafka:29092")?
            .set_default("kafka.client_id", "clickstream-harness")?
            .set_default("kafka.message_timeout_ms", 10_000)?
            .set_default("kafka.connect_max_attempts", 10)?
            .set_default("kafka.connect_initial_backoff_ms", 1_000)?
            .set_default("topics.page_views", "page_views")?
            .set_default("topics.ad_clicks", "ad_clicks")?
            .set_default("replay.pacing_ms", 100)?
            .set_default("replay.ack_timeout_ms", 10_000)?
            .set_default("logging.level", "info")?
            // Add configuration files if they exist
            .add_source(file("default"))
            .add_source(file(&environment))
            .add_source(file("local"))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("CLICKSTREAM_HARNESS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl KafkaSettings {
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn connect_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_initial_backoff_ms)
    }
}

impl TopicSettings {
    pub fn topic_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::PageViews => &self.page_views,
            Channel::AdClicks => &self.ad_clicks,
        }
    }
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            page_views: Channel::PageViews.to_string(),
            ad_clicks: Channel::AdClicks.to_string(),
        }
    }
}

impl ReplaySettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_can_be_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path()).unwrap();

        assert_eq!(settings.kafka.connect_max_attempts, 10);
        assert_eq!(settings.kafka.message_timeout(), Duration::from_secs(10));
        assert_eq!(settings.replay.pacing(), Duration::from_millis(100));
        assert!(settings.scenario.base_time.is_none());
    }

    #[test]
    fn test_local_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = std::fs::File::create(dir.path().join("local.toml")).unwrap();
        writeln!(
            local,
            r#"
[kafka]
bootstrap_servers = "localhost:9092"

[replay]
pacing_ms = 0

[scenario]
base_time = "2025-03-01T08:00:00"
"#
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).unwrap();

        assert_eq!(settings.kafka.bootstrap_servers, "localhost:9092");
        assert_eq!(settings.replay.pacing(), Duration::ZERO);
        assert_eq!(
            settings.scenario.base_time.map(|t| t.to_string()),
            Some("2025-03-01 08:00:00".to_string())
        );
    }

    #[test]
    fn test_topics_follow_channels() {
        let topics = TopicSettings::default();
        assert_eq!(topics.topic_for(Channel::PageViews), "page_views");
        assert_eq!(topics.topic_for(Channel::AdClicks), "ad_clicks");
    }
}
