//! Client for the central server's sync endpoint.
//!
//! One request per queue item, no retries here: the offline queue owns the
//! retry counter, so a failed push simply reports the error back.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use carehome_core::sync::{SyncAcknowledgement, SyncQueueItem, SyncTransport};

use crate::crypto::sha256_checksum;
use crate::error::{Result, SyncClientError};
use crate::types::{ApiErrorResponse, SyncItemEnvelope, SyncPushResponse};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct SyncApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SyncApiClient {
    /// `base_url` is the server root, e.g. `https://mar.example.org`.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(SyncClientError::auth("Sync token is empty"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("Sync API response status: {}", status);
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("Sync API response error ({}): {}", status, preview);
    }

    fn headers(&self, idempotency_key: &str, checksum: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| SyncClientError::auth("Invalid sync token format"))?,
        );
        headers.insert(
            "x-idempotency-key",
            HeaderValue::from_str(idempotency_key)
                .map_err(|_| SyncClientError::invalid_request("Invalid sync item id"))?,
        );
        headers.insert(
            "x-payload-checksum",
            HeaderValue::from_str(checksum)
                .map_err(|_| SyncClientError::invalid_request("Invalid payload checksum"))?,
        );
        Ok(headers)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(SyncClientError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(SyncClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            SyncClientError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Pushes one item.
    ///
    /// POST /api/v1/sync/items
    pub async fn push_item(&self, item: &SyncQueueItem) -> Result<SyncPushResponse> {
        let url = format!("{}/api/v1/sync/items", self.base_url);
        let body = serde_json::to_vec(&SyncItemEnvelope::from(item))?;
        let checksum = sha256_checksum(&body);
        let response = self
            .client
            .post(&url)
            .headers(self.headers(&item.id, &checksum)?)
            .body(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl SyncTransport for SyncApiClient {
    async fn push(&self, item: &SyncQueueItem) -> carehome_core::Result<SyncAcknowledgement> {
        match self.push_item(item).await {
            Ok(response) => Ok(SyncAcknowledgement {
                acknowledged_ids: response.acknowledged_ids,
            }),
            Err(err) => {
                warn!(
                    "Push of sync item {} failed ({:?}): {}",
                    item.id,
                    err.retry_class(),
                    err
                );
                Err(err.into())
            }
        }
    }
}
