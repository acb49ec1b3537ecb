//! Slack incoming-webhook payload

use serde::{Deserialize, Serialize};

/// A Slack message; also the body accepted by the relay endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(default)]
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackAttachment {
    #[serde(default)]
    pub fallback: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub fields: Vec<SlackField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackField {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub short: bool,
}

impl SlackMessage {
    /// Single attachment announcing `color` as the active level
    pub fn for_level(color: &str) -> Self {
        Self {
            attachments: vec![SlackAttachment {
                fallback: String::new(),
                color: color.to_string(),
                fields: vec![SlackField {
                    title: format!("Color: {}", color),
                    value: String::new(),
                    short: false,
                }],
            }],
        }
    }
}
