use serde::de::IgnoredAny;
use serde::Deserialize;
use std::time::Duration;

use super::MetricSource;

/// Instant-query client for the Prometheus HTTP API
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run an instant query and return the first sample's value
    pub async fn query_scalar(&self, query: &str) -> Result<f64, FetchError> {
        let url = format!("{}/api/v1/query", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| FetchError::new(query, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::new(
                query,
                format!("Prometheus returned status {}", response.status()),
            ));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(query, format!("malformed response: {}", e)))?;

        let raw = body
            .first_value()
            .ok_or_else(|| FetchError::new(query, "empty result set"))?;

        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::new(query, format!("{:?} is not numeric", raw)))?;

        tracing::debug!(query = %query, value = %raw, "Fetched metric value");

        Ok(value)
    }
}

impl MetricSource for PrometheusClient {
    async fn fetch_scalar(&self, query: &str) -> Result<f64, FetchError> {
        self.query_scalar(query).await
    }
}

/// `{"data": {"result": [{"value": [<ts>, "<value>"]}]}}`
#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    value: Option<(IgnoredAny, String)>,
}

impl QueryResponse {
    fn first_value(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .result
            .first()?
            .value
            .as_ref()
            .map(|(_, v)| v.as_str())
    }
}

/// Any failure to obtain a reading; the cause is kept for logging only
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to fetch metric {query:?}: {reason}")]
pub struct FetchError {
    pub query: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }
}
