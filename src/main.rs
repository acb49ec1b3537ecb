//! Prometheus Slacker
//!
//! Run with: prometheus-slacker <config.json path>
//!
//! Environment variables:
//! - PROMETHEUS_SLACKER_HOST: Bind address for the relay listener (default: 0.0.0.0)
//! - RUST_LOG: Log level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use prometheus_slacker::api::{run_server, ServerConfig};
use prometheus_slacker::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "prometheus-slacker")]
#[command(about = "Post Prometheus threshold levels to Slack webhooks")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prometheus_slacker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::load(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let host = std::env::var("PROMETHEUS_SLACKER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let server_config = ServerConfig::from_config(host, &config)?;

    tracing::info!("Prometheus slacker configuration:");
    tracing::info!("  Config version: {}", config.version);
    tracing::info!("  Listen: {}:{}", server_config.host, server_config.port);
    tracing::info!("  Prometheus: {}", config.prometheus_url);
    tracing::info!(
        "  Scrape interval: {} minutes",
        config.scrape_interval().as_secs() / 60
    );
    tracing::info!("  HTTP timeout: {:?}", config.http_timeout());
    tracing::info!("  Webhooks: {}", config.slack_webhooks.len());
    for (i, level) in config.notification_levels.iter().enumerate() {
        tracing::info!(
            "    [{}] {} {} -> {:?} ({} metrics)",
            i,
            level.color,
            level.emoji,
            level.slack_webhooks,
            level.metrics.len()
        );
    }

    run_server(server_config, config).await
}
