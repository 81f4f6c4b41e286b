//! HTTP client for the public key-value endpoint.
//!
//! Each document is addressed as `{base_url}/{bucket}_{key}`. `GET` reads the
//! raw JSON text and `POST` replaces it. There are no versions, ETags or
//! conditional writes.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::instrument;
use url::Url;

use crate::error::StoreError;
use crate::retry::{with_retry, RetryConfig};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    retry: RetryConfig,
}

impl RemoteStore {
    /// Create a client for `bucket` under `base_url`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidUrl` if `base_url` is not an http(s) URL.
    pub fn new(
        base_url: &str,
        bucket: &str,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(StoreError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }
        if bucket.trim().is_empty() {
            return Err(StoreError::InvalidUrl("bucket name is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            retry,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Full URL of the document stored under `key`.
    pub fn key_url(&self, key: &str) -> String {
        format!("{}/{}_{}", self.base_url, self.bucket, key)
    }

    /// Fetch the raw document text.
    ///
    /// Returns `Ok(None)` when the document does not exist yet (404 or an
    /// empty body).
    ///
    /// # Errors
    /// Network failures and non-success statuses other than 404.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let url = self.key_url(key);
        let response = with_retry(&self.retry, || self.client.get(&url).send()).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("No document stored under {}", key);
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Replace the document stored under `key` with `body`.
    ///
    /// # Errors
    /// Network failures and non-success statuses.
    #[instrument(skip(self, body), level = "debug", fields(bytes = body.len()))]
    pub async fn put_raw(&self, key: &str, body: &str) -> Result<(), StoreError> {
        let url = self.key_url(key);
        let response = with_retry(&self.retry, || {
            self.client.post(&url).body(body.to_string()).send()
        })
        .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(StoreError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish()
    }
}
