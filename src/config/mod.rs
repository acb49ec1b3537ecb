pub mod settings;

pub use settings::{Config, ConfigError, Metric, NotificationLevel, SlackWebhook};
