//! Prometheus Slacker: threshold alerting from Prometheus to Slack
//!
//! Every few minutes the configured notification levels are evaluated in
//! order against Prometheus instant queries. The last level whose metric
//! reached its threshold becomes active and is posted to the level's Slack
//! webhooks. A small HTTP listener also relays ready-made Slack messages to
//! every configured webhook.
//!
//! # Example
//!
//! ```no_run
//! use prometheus_slacker::config::Config;
//! use prometheus_slacker::alerts::select_level;
//! use prometheus_slacker::prometheus::PrometheusClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("config.json")?;
//! let client = PrometheusClient::new(config.prometheus_url.clone(), config.http_timeout())?;
//!
//! if let Some(level) = select_level(&client, &config.notification_levels).await {
//!     println!("Active level: {}", level.color);
//! }
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod prometheus;

// Re-export commonly used types
pub use alerts::{Notifier, Scraper, SlackMessage};
pub use config::{Config, ConfigError};
pub use prometheus::{FetchError, MetricSource, PrometheusClient};
