//! Retry logic with exponential backoff
//!
//! Each page request runs through a small, bounded state machine:
//!
//! ```text
//! Attempting -> Success
//!            -> RetryableFailure -> Sleeping -> Attempting
//!            -> FatalFailure
//! ```
//!
//! A failure is fatal when the error is not retryable or the retry ceiling is
//! exhausted. Delays grow as `base^attempt` with no jitter, unless the error
//! carries a server-requested delay (`Retry-After`).
//!
//! # Example
//!
//! ```no_run
//! use asrm_export::retry::{IsRetryable, retry_with_backoff};
//! use asrm_export::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! retry_with_backoff(&config, || async { Ok::<_, MyError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, refused connections, overloaded server) return `true`.
/// Permanent failures (bad request, forbidden, malformed body) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;

    /// Delay requested by the remote side, overriding the computed backoff
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Failed before a complete response arrived
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::HttpStatus { .. } => self.is_retryable_status(),
            Error::Config { .. } | Error::Serialization(_) | Error::Io(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::HttpStatus { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// What to do after a failed attempt
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then attempt again
    Retry(Duration),
    /// Stop and surface the error
    GiveUp,
}

impl RetryConfig {
    /// Decide the transition out of a failed attempt
    ///
    /// `attempt` is the 1-based number of the retry that would follow.
    pub fn decide<E: IsRetryable>(&self, attempt: u32, error: &E) -> RetryDecision {
        if !error.is_retryable() || attempt > self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry(
            error
                .retry_after()
                .unwrap_or_else(|| self.backoff_for(attempt)),
        )
    }
}

/// Parse a `Retry-After` value given in seconds
///
/// Fractional values are accepted. HTTP-dates, negative and non-finite values
/// yield `None` so the caller falls back to exponential backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Execute an async operation, retrying transient failures with backoff
///
/// # Arguments
///
/// * `config` - Retry ceiling and backoff parameters
/// * `operation` - Async closure that returns Result<T, E> where E implements IsRetryable
///
/// # Returns
///
/// Returns the successful result, or the last error once it is non-retryable
/// or `max_retries` retries have been spent (`max_retries + 1` calls in total).
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;
                match config.decide(attempt, &e) {
                    RetryDecision::Retry(delay) => {
                        tracing::warn!(
                            error = %e,
                            attempt,
                            max_retries = config.max_retries,
                            delay = ?delay,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        if e.is_retryable() {
                            tracing::error!(
                                error = %e,
                                attempts = attempt,
                                "Request failed after all retries exhausted"
                            );
                        } else {
                            tracing::error!(error = %e, "Request failed with non-retryable error");
                        }
                        return Err(e);
                    }
                }
            }
        }
    }
}
