//! Level evaluation and notification dispatch
//!
//! Each cycle walks the configured levels, compares Prometheus readings
//! against thresholds, and posts the winning level to its Slack webhooks.

pub mod message;
pub mod notifier;
pub mod scraper;
pub mod selector;
pub mod threshold;

pub use message::{SlackAttachment, SlackField, SlackMessage};
pub use notifier::{Notifier, NotifierError};
pub use scraper::Scraper;
pub use selector::{evaluate_level, last_satisfied, select_level, LevelOutcome};
pub use threshold::{evaluate, exceeds, EvaluatorError};
