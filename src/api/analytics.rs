//! Conversation aggregates API client.

use chrono::DateTime;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::AGGREGATES_PATH;
use crate::error::ApiError;

/// Aggregate query body, sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryBody {
    pub interval: String,
    pub metrics: Vec<String>,
}

impl QueryBody {
    /// Build a query body over an ISO 8601 `<start>/<end>` interval.
    pub fn new(interval: impl Into<String>, metrics: Vec<String>) -> Result<Self, ApiError> {
        let interval = interval.into();

        let (start, end) = interval.split_once('/').ok_or_else(|| {
            ApiError::InvalidQuery(format!("interval '{}' is not a <start>/<end> range", interval))
        })?;
        let start = DateTime::parse_from_rfc3339(start).map_err(|e| {
            ApiError::InvalidQuery(format!("invalid interval start '{}': {}", start, e))
        })?;
        let end = DateTime::parse_from_rfc3339(end).map_err(|e| {
            ApiError::InvalidQuery(format!("invalid interval end '{}': {}", end, e))
        })?;
        if start > end {
            return Err(ApiError::InvalidQuery(format!(
                "interval start {} is after end {}",
                start, end
            )));
        }

        if metrics.is_empty() {
            return Err(ApiError::InvalidQuery("at least one metric is required".into()));
        }

        Ok(Self { interval, metrics })
    }
}

/// Analytics API client.
#[derive(Clone)]
pub struct AnalyticsClient {
    base_url: String,
    http_client: Client,
}

impl AnalyticsClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClientInit(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    /// Run a conversation aggregates query and return the raw JSON result.
    pub async fn query_aggregates(&self, token: &str, body: &QueryBody) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, AGGREGATES_PATH);
        tracing::debug!(url = %url, interval = %body.interval, "Aggregates API POST request");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            Ok(serde_json::from_str(&text)?)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, response = %body, "Aggregates query failed");
            Err(ApiError::QueryFailed { status, body })
        }
    }
}

impl std::fmt::Debug for AnalyticsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
