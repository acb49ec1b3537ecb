//! Configuration file types

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Default deadline for every outbound HTTP call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration, loaded once at startup and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// Port for the relay listener
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    /// Webhook targets by id
    #[serde(default)]
    pub slack_webhooks: HashMap<String, SlackWebhook>,
    /// Base URL of the Prometheus server
    pub prometheus_url: String,
    /// Minutes between scrape cycles (clamped to at least one)
    #[serde(default)]
    pub scrapper_minutes: i64,
    /// Levels in ascending severity order; the last matching level wins
    #[serde(default)]
    pub notification_levels: Vec<NotificationLevel>,
    /// Deadline for Prometheus queries and webhook posts
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

/// A Slack incoming webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackWebhook {
    pub url: String,
    #[serde(default)]
    pub show_details: HashMap<String, bool>,
}

/// A severity level with its checks and webhook routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLevel {
    /// Level name; also the attachment color
    pub color: String,
    #[serde(default)]
    pub emoji: String,
    /// Webhook ids notified when this level is active
    #[serde(default)]
    pub slack_webhooks: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl NotificationLevel {
    /// Create a level with no metrics and no webhooks
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            emoji: String::new(),
            slack_webhooks: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Add a metric check
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Route to a webhook id
    pub fn with_webhook(mut self, id: impl Into<String>) -> Self {
        self.slack_webhooks.push(id.into());
        self
    }
}

/// A single Prometheus query compared against a threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub display_name: String,
    /// PromQL expression, sent as-is
    pub query: String,
    /// Decimal string; parsed at evaluation time
    #[serde(deserialize_with = "string_or_number")]
    pub threshold: String,
}

impl Metric {
    pub fn new(
        display_name: impl Into<String>,
        query: impl Into<String>,
        threshold: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            query: query.into(),
            threshold: threshold.into(),
        }
    }
}

impl Config {
    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a configuration document
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross references and values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_port()?;

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.http_timeout_secs));
        }

        if self.prometheus_url.trim().is_empty() {
            return Err(ConfigError::MissingField("prometheus_url"));
        }

        for level in &self.notification_levels {
            for id in &level.slack_webhooks {
                if !self.slack_webhooks.contains_key(id) {
                    return Err(ConfigError::UnknownWebhook {
                        level: level.color.clone(),
                        webhook: id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Port the relay listener binds to
    pub fn listen_port(&self) -> Result<u16, ConfigError> {
        self.port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(self.port.clone()))
    }

    /// Sleep between scrape cycles, never less than one minute
    pub fn scrape_interval(&self) -> Duration {
        let minutes = self.scrapper_minutes.max(1) as u64;
        Duration::from_secs(minutes.saturating_mul(60))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Resolve a level's webhook ids, keeping the level's order
    pub fn webhooks_for<'a>(
        &'a self,
        level: &'a NotificationLevel,
    ) -> impl Iterator<Item = (&'a str, &'a SlackWebhook)> + 'a {
        level.slack_webhooks.iter().filter_map(move |id| {
            self.slack_webhooks
                .get(id)
                .map(|webhook| (id.as_str(), webhook))
        })
    }

    /// Every configured webhook, ordered by id
    pub fn all_webhooks(&self) -> Vec<(&str, &SlackWebhook)> {
        let mut webhooks: Vec<_> = self
            .slack_webhooks
            .iter()
            .map(|(id, webhook)| (id.as_str(), webhook))
            .collect();
        webhooks.sort_by(|a, b| a.0.cmp(b.0));
        webhooks
    }
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Accept `"8080"` as well as `8080`
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Configuration errors; all of them are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    #[error("Invalid HTTP timeout: {0} seconds")]
    InvalidTimeout(u64),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Level {level:?} references unknown webhook {webhook:?}")]
    UnknownWebhook { level: String, webhook: String },
}
