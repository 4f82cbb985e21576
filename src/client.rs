//! HTTP client construction
//!
//! One pooled client is built per run and reused for every page. It carries the
//! fixed request headers and the per-request timeout, and performs no retries
//! of its own; those belong to [`crate::retry`].

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;

/// User-Agent sent with every request
pub const USER_AGENT: &str = "VisionOne-DeviceVuln-Fetcher/1.0";

/// Idle connections kept per host
pub const POOL_MAX_IDLE_PER_HOST: usize = 50;

/// Build the client used for every page request
///
/// Compression (gzip, deflate, brotli) is negotiated by reqwest itself, which
/// sets `Accept-Encoding` and decodes the body transparently.
///
/// # Errors
///
/// Returns `Error::Config` if the token is missing, a placeholder, or cannot be
/// sent as a header value, and `Error::Network` if the TLS backend fails to
/// initialize.
pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    let headers = default_headers(config.bearer_token()?)?;

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(config.request_timeout())
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn default_headers(token: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        Error::config(
            "token contains characters not allowed in an HTTP header",
            crate::config::TOKEN_ENV,
        )
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(headers)
}
