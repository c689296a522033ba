//! Batch push to the companion ingestion server.

use std::time::Duration;

use purchase_store::PurchaseRecord;
use serde::Deserialize;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PushError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// What the ingestion server reports back after applying a batch.
#[derive(Debug, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(default)]
    pub added: usize,
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub total: usize,
}

pub struct PushClient {
    http: reqwest::Client,
    base_url: String,
}

impl PushClient {
    pub fn new(base_url: &str) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends the batch as a raw JSON array, the shape the server ingests.
    pub async fn push(&self, records: &[PurchaseRecord]) -> Result<IngestResponse, PushError> {
        let url = format!("{}/api/orders", self.base_url);
        tracing::info!("pushing {} records to {url}", records.len());

        let response = self.http.post(&url).json(records).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<IngestResponse>().await?)
    }
}
