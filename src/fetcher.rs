//! Page fetching
//!
//! [`PageFetcher`] issues one GET per page through the retry policy and decodes
//! the body as a [`Page`]. The stream writer only depends on the [`PageSource`]
//! trait, so it can be driven by any source of pages.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::{parse_retry_after, retry_with_backoff};
use crate::types::Page;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

/// Query parameters attached to a page request
pub type Query = [(&'static str, String)];

/// Source of pages for the stream writer
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url`, appending `query` when given
    async fn fetch(&self, url: &str, query: Option<&Query>) -> Result<Page>;
}

/// Fetches pages over HTTP with retry and backoff
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl PageFetcher {
    /// Create a fetcher from a client built by [`crate::client::build_client`]
    pub fn new(client: reqwest::Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Retry policy applied to every request
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Fetch one page, retrying transient failures
    ///
    /// Every retry reuses the same URL and query.
    ///
    /// # Errors
    ///
    /// - `Error::Network` when the transport fails and retries are exhausted
    /// - `Error::HttpStatus` for a non-retryable status, or a retryable one
    ///   that persisted past the retry ceiling
    /// - `Error::Serialization` if a 200 response is not a valid page
    pub async fn fetch_page(&self, url: &str, query: Option<&Query>) -> Result<Page> {
        retry_with_backoff(&self.retry, || self.fetch_once(url, query)).await
    }

    async fn fetch_once(&self, url: &str, query: Option<&Query>) -> Result<Page> {
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "Received page response");

        if status == StatusCode::OK {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);

        Err(Error::HttpStatus {
            status,
            url: url.to_string(),
            retry_after,
        })
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str, query: Option<&Query>) -> Result<Page> {
        self.fetch_page(url, query).await
    }
}
