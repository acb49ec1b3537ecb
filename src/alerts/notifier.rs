//! Webhook delivery for level notifications and relayed messages

use std::time::Duration;

use super::message::SlackMessage;
use crate::config::{Config, NotificationLevel, SlackWebhook};

/// Posts Slack messages to webhooks, best effort and one target at a time
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
}

impl Notifier {
    /// Create a notifier whose posts give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Send `message` to every webhook bound to `level`
    pub async fn dispatch(
        &self,
        config: &Config,
        level: &NotificationLevel,
        message: &SlackMessage,
    ) -> Result<(), NotifierError> {
        tracing::info!(
            level = %level.color,
            webhooks = ?level.slack_webhooks,
            "Dispatching level notification"
        );
        self.dispatch_raw(message, config.webhooks_for(level)).await
    }

    /// Send `message` to each target; a failed target never stops the rest
    pub async fn dispatch_raw<'a, I>(
        &self,
        message: &SlackMessage,
        targets: I,
    ) -> Result<(), NotifierError>
    where
        I: IntoIterator<Item = (&'a str, &'a SlackWebhook)>,
    {
        let mut errors = Vec::new();

        for (id, webhook) in targets {
            if let Err(e) = self.send(id, webhook, message).await {
                tracing::error!(webhook = %id, error = %e, "Failed to send Slack message");
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotifierError::Multiple(errors))
        }
    }

    /// Post to a single webhook
    pub async fn send(
        &self,
        id: &str,
        webhook: &SlackWebhook,
        message: &SlackMessage,
    ) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&webhook.url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotifierError::Delivery {
                webhook: id.to_string(),
                reason: format!("Failed to send webhook: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(NotifierError::Delivery {
                webhook: id.to_string(),
                reason: format!("Webhook returned status {}", response.status()),
            });
        }

        tracing::debug!(webhook = %id, "Slack message sent");

        Ok(())
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Delivery to webhook {webhook:?} failed: {reason}")]
    Delivery { webhook: String, reason: String },

    #[error("Multiple notification failures: {0:?}")]
    Multiple(Vec<NotifierError>),
}

impl NotifierError {
    /// Ids of the webhooks that did not receive the message
    pub fn failed_webhooks(&self) -> Vec<&str> {
        match self {
            NotifierError::Delivery { webhook, .. } => vec![webhook.as_str()],
            NotifierError::Multiple(errors) => {
                errors.iter().flat_map(|e| e.failed_webhooks()).collect()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    pub(crate) type Received = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    /// Webhook sink: `/hook/:name` records the body, `/hook/fail` answers 500
    pub(crate) async fn spawn_webhook_sink() -> (String, Received) {
        async fn record(
            State(received): State<Received>,
            Path(name): Path<String>,
            Json(body): Json<serde_json::Value>,
        ) -> StatusCode {
            received.lock().unwrap().push((name.clone(), body));
            if name == "fail" {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            }
        }

        let received: Received = Arc::default();
        let app = Router::new()
            .route("/hook/:name", post(record))
            .with_state(Arc::clone(&received));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), received)
    }

    pub(crate) fn webhook(url: String) -> SlackWebhook {
        SlackWebhook {
            url,
            show_details: HashMap::new(),
        }
    }

    fn notifier() -> Notifier {
        Notifier::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_failed_target_does_not_block_others() {
        let (base, received) = spawn_webhook_sink().await;
        let first = webhook(format!("{}/hook/first", base));
        let second = webhook(format!("{}/hook/fail", base));
        let third = webhook(format!("{}/hook/third", base));
        let message = SlackMessage::for_level("danger");

        let result = notifier()
            .dispatch_raw(
                &message,
                vec![("first", &first), ("second", &second), ("third", &third)],
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.failed_webhooks(), vec!["second"]);

        let received = received.lock().unwrap();
        let names: Vec<&str> = received.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["first", "fail", "third"]);
        assert_eq!(received[2].1, serde_json::to_value(&message).unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_uses_level_webhooks() {
        let (base, received) = spawn_webhook_sink().await;
        let raw = format!(
            r#"{{
                "port": "8080",
                "prometheus_url": "http://p",
                "slack_webhooks": {{
                    "ops": {{"url": "{base}/hook/ops"}},
                    "oncall": {{"url": "{base}/hook/oncall"}}
                }},
                "notification_levels": [{{"color": "warning", "slack_webhooks": ["ops"]}}]
            }}"#
        );
        let config = Config::from_json(&raw).unwrap();
        let level = &config.notification_levels[0];

        tokio_test::assert_ok!(
            notifier()
                .dispatch(&config, level, &SlackMessage::for_level(&level.color))
                .await
        );

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "ops");
        assert_eq!(received[0].1["attachments"][0]["color"], "warning");
        assert_eq!(
            received[0].1["attachments"][0]["fields"][0]["title"],
            "Color: warning"
        );
    }

    #[tokio::test]
    async fn test_slow_webhook_times_out() {
        let app = Router::new().route(
            "/",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let notifier = Notifier::new(Duration::from_millis(200)).unwrap();
        let target = webhook(format!("http://{}/", addr));

        let result = notifier
            .send("slow", &target, &SlackMessage::default())
            .await;
        assert!(matches!(result, Err(NotifierError::Delivery { .. })));
    }

    #[tokio::test]
    async fn test_no_targets_is_ok() {
        let targets: Vec<(&str, &SlackWebhook)> = Vec::new();
        tokio_test::assert_ok!(
            notifier()
                .dispatch_raw(&SlackMessage::default(), targets)
                .await
        );
    }
}
