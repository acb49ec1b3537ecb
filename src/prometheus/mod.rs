//! Metric source backed by the Prometheus query API

pub mod client;

pub use client::{FetchError, PrometheusClient};

use std::future::Future;

/// Something that can turn a query into a single reading
pub trait MetricSource: Send + Sync {
    /// Evaluate `query` and return its scalar value
    fn fetch_scalar(&self, query: &str) -> impl Future<Output = Result<f64, FetchError>> + Send;
}
