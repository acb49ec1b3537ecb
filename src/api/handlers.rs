use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::alerts::{Notifier, SlackMessage};
use crate::config::Config;

/// Largest relay body accepted before the read is treated as failed
pub const MAX_RELAY_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub notifier: Notifier,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Relay
// ============================================================================

/// Forward a ready-made Slack message to every configured webhook
pub async fn relay(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let bytes = axum::body::to_bytes(body, MAX_RELAY_BODY_BYTES)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let message: SlackMessage = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "Rejected relay payload");
        ApiError::BadRequest("Invalid payload".to_string())
    })?;

    let targets = state.config.all_webhooks();
    tracing::info!(
        attachments = message.attachments.len(),
        webhooks = targets.len(),
        "Relaying message"
    );

    if let Err(e) = state.notifier.dispatch_raw(&message, targets).await {
        tracing::warn!(failed = ?e.failed_webhooks(), "Relay not delivered everywhere");
    }

    Ok(StatusCode::OK)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
