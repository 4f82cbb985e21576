//! Error types for asrm-export
//!
//! This module provides the error taxonomy for an export run:
//! - Configuration errors, raised before any network call
//! - Transport and HTTP status errors from the page fetcher
//! - Decode and file errors from the stream writer and post-processor
//! - Mapping of each error to a process exit code

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for asrm-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP statuses that are retried with backoff
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Main error type for asrm-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "TM_API_TOKEN")
        key: Option<String>,
    },

    /// Transport-level failure (connect, timeout, reset) before a complete response
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// The status the server returned
        status: StatusCode,
        /// The request URL, without query parameters
        url: String,
        /// Delay requested by the server through `Retry-After`, if numeric
        retry_after: Option<Duration>,
    },

    /// A response body or item could not be decoded or encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while writing or rewriting the output file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a setting
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns true if this is an HTTP status the server expects clients to retry
    pub fn is_retryable_status(&self) -> bool {
        matches!(self, Error::HttpStatus { status, .. } if RETRYABLE_STATUSES.contains(&status.as_u16()))
    }
}

/// Trait for mapping errors to process exit codes
pub trait ToExitCode {
    /// Get the exit code the binary terminates with for this error
    fn exit_code(&self) -> u8;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        match self {
            // Pre-flight failure, nothing was fetched
            Error::Config { .. } => 1,
            // Anything raised while streaming
            Error::Network(_)
            | Error::HttpStatus { .. }
            | Error::Serialization(_)
            | Error::Io(_) => 2,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }
}
