use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, relay, AppState};
use crate::alerts::{Notifier, Scraper};
use crate::config::{Config, ConfigError};
use crate::prometheus::PrometheusClient;

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Bind on `host` at the port named in the config file
    pub fn from_config(host: impl Into<String>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            host: host.into(),
            port: config.listen_port()?,
        })
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(relay))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the scrape loop and the relay listener until Ctrl-C
pub async fn run_server(
    server_config: ServerConfig,
    config: Arc<Config>,
) -> Result<(), Box<dyn std::error::Error>> {
    let timeout = config.http_timeout();
    let source = PrometheusClient::new(config.prometheus_url.clone(), timeout)?;
    let notifier = Notifier::new(timeout)?;
    tracing::info!(prometheus = %source.base_url(), ?timeout, "Prometheus client ready");

    let scraper = Arc::new(Scraper::new(
        Arc::clone(&config),
        source,
        notifier.clone(),
    ));
    let scraper_handle = Arc::clone(&scraper).start();

    let state = Arc::new(AppState { config, notifier });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port).parse()?;
    tracing::info!("Starting relay listener on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&scraper)))
        .await?;

    scraper_handle.abort();

    tracing::info!("Prometheus slacker stopped");
    Ok(())
}

async fn shutdown_signal(scraper: Arc<Scraper<PrometheusClient>>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, stopping scraper...");
    scraper.stop();
}
