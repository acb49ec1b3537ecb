//! Background scrape loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::message::SlackMessage;
use super::notifier::Notifier;
use super::selector::select_level;
use crate::config::Config;
use crate::prometheus::MetricSource;

/// Periodically selects the active level and notifies its webhooks
pub struct Scraper<S> {
    config: Arc<Config>,
    source: S,
    notifier: Notifier,
    running: Arc<AtomicBool>,
}

impl<S: MetricSource + 'static> Scraper<S> {
    pub fn new(config: Arc<Config>, source: S, notifier: Notifier) -> Self {
        Self {
            config,
            source,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the loop; the first cycle runs immediately
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let interval = self.config.scrape_interval();
            tracing::info!(
                "Scraper started, checking every {} minutes",
                interval.as_secs() / 60
            );

            while self.running.load(Ordering::SeqCst) {
                self.run_cycle().await;

                tracing::debug!("Sleeping {:?} until next cycle", interval);
                tokio::time::sleep(interval).await;
            }

            tracing::info!("Scraper stopped");
        })
    }

    /// Stop after the current cycle
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one select-and-notify cycle, returning the active level's color
    pub async fn run_cycle(&self) -> Option<String> {
        let active = select_level(&self.source, &self.config.notification_levels).await?;

        let message = SlackMessage::for_level(&active.color);
        if let Err(e) = self.notifier.dispatch(&self.config, active, &message).await {
            tracing::error!(
                level = %active.color,
                failed = ?e.failed_webhooks(),
                "Level notification not delivered everywhere"
            );
        }

        Some(active.color.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::notifier::tests::{spawn_webhook_sink, Received};
    use crate::alerts::selector::tests::FakeSource;
    use std::time::Duration;

    fn config(base: &str) -> Arc<Config> {
        let raw = format!(
            r#"{{
                "port": "8080",
                "prometheus_url": "http://p",
                "scrapper_minutes": 1,
                "slack_webhooks": {{
                    "ops": {{"url": "{base}/hook/ops"}},
                    "oncall": {{"url": "{base}/hook/oncall"}},
                    "broken": {{"url": "{base}/hook/fail"}}
                }},
                "notification_levels": [
                    {{"color": "good", "slack_webhooks": ["ops"], "metrics": []}},
                    {{"color": "danger", "slack_webhooks": ["broken", "oncall"],
                      "metrics": [{{"display_name": "errors", "query": "errors", "threshold": "10"}}]}}
                ]
            }}"#
        );
        Arc::new(Config::from_json(&raw).unwrap())
    }

    fn scraper(base: &str, source: FakeSource) -> Scraper<FakeSource> {
        let notifier = Notifier::new(Duration::from_secs(5)).unwrap();
        Scraper::new(config(base), source, notifier)
    }

    fn hooks(received: &Received) -> Vec<String> {
        received
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_cycle_notifies_active_level() {
        let (base, received) = spawn_webhook_sink().await;
        let scraper = scraper(&base, FakeSource::default().with("errors", 12.0));

        assert_eq!(scraper.run_cycle().await.as_deref(), Some("danger"));
        // A failing webhook still lets the next one receive the message.
        assert_eq!(hooks(&received), vec!["fail", "oncall"]);
    }

    #[tokio::test]
    async fn test_cycle_falls_back_to_baseline() {
        let (base, received) = spawn_webhook_sink().await;
        let scraper = scraper(&base, FakeSource::default().with("errors", 2.0));

        assert_eq!(scraper.run_cycle().await.as_deref(), Some("good"));
        assert_eq!(hooks(&received), vec!["ops"]);
    }

    #[tokio::test]
    async fn test_cycle_survives_fetch_failure() {
        let (base, received) = spawn_webhook_sink().await;
        let scraper = scraper(&base, FakeSource::default().failing("errors"));

        assert_eq!(scraper.run_cycle().await.as_deref(), Some("good"));
        assert_eq!(hooks(&received), vec!["ops"]);
    }

    #[tokio::test]
    async fn test_start_runs_first_cycle_immediately() {
        let (base, received) = spawn_webhook_sink().await;
        let scraper = Arc::new(scraper(&base, FakeSource::default().with("errors", 2.0)));

        let handle = Arc::clone(&scraper).start();
        assert!(scraper.is_running());

        let mut delivered = false;
        for _ in 0..50 {
            if !hooks(&received).is_empty() {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered);

        scraper.stop();
        assert!(!scraper.is_running());
        handle.abort();
    }
}
