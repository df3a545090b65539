use crate::reading::{HistorySeries, LatestReading};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a poll produced nothing. Callers treat every variant the same way:
/// log it and keep the last good values.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where readings come from.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// `GET /latest`
    async fn latest(&self) -> Result<LatestReading, FetchError>;

    /// `GET /history?hours={hours}`, newest first.
    async fn history(&self, hours: u32) -> Result<HistorySeries, FetchError>;
}

/// HTTP client for the sensor backend.
#[derive(Debug, Clone)]
pub struct SensorClient {
    http: reqwest::Client,
    base_url: String,
}

impl SensorClient {
    /// Requests carry no timeout unless one is given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SensorSource for SensorClient {
    async fn latest(&self) -> Result<LatestReading, FetchError> {
        self.get_json("/latest", &[]).await
    }

    async fn history(&self, hours: u32) -> Result<HistorySeries, FetchError> {
        self.get_json("/history", &[("hours", hours.to_string())]).await
    }
}
