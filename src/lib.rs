//! # asrm-export
//!
//! Streaming exporter for paginated vulnerability-scan results.
//!
//! The exporter walks a paginated REST listing of vulnerable devices from the
//! first page to the last, following the server's `nextLink`, and writes every
//! item into one JSON array on disk as each page arrives. Transient network and
//! HTTP failures are retried with exponential backoff.
//!
//! ## Design
//!
//! - **Sequential** - one request in flight, one page in memory
//! - **Explicit configuration** - a single [`Config`] is built at startup and passed down
//! - **Pass-through** - items are re-encoded compactly, never interpreted
//!
//! ## Quick Start
//!
//! ```no_run
//! use asrm_export::{Config, run_export};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         token: Some("eyJ0eXAiOiJKV1Qi...".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let summary = run_export(&config).await?;
//!     println!("Wrote {} items to {}", summary.items, summary.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client construction
pub mod client;
/// Configuration types
pub mod config;
/// Item serialization strategies
pub mod encoder;
/// Error types
pub mod error;
/// Page fetching with retry
pub mod fetcher;
/// Tracing subscriber setup
pub mod logging;
/// Optional pretty-printing of the output file
pub mod post_process;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Streaming pagination writer
pub mod writer;

// Re-export commonly used types
pub use config::{Config, LogFormat, PageSize, RetryConfig};
pub use encoder::{CompactJsonEncoder, ItemEncoder};
pub use error::{Error, Result, ToExitCode};
pub use fetcher::{PageFetcher, PageSource};
pub use types::{Item, Page, RunSummary};
pub use writer::{StreamWriter, WriterOptions};

/// Run a complete export described by `config`
///
/// Validates the configuration, streams every page into a new output file in
/// `config.output_dir`, then pretty-prints it if `compact_output` is off. A
/// failed pretty-print is logged and does not fail the run.
///
/// # Errors
///
/// Returns `Error::Config` before any request if the configuration is invalid,
/// otherwise the first unrecovered fetch or write error.
pub async fn run_export(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let client = client::build_client(config)?;
    let fetcher = PageFetcher::new(client, config.retry());
    let writer = StreamWriter::new(
        &fetcher,
        encoder::select_encoder(),
        WriterOptions::from_config(config),
    );

    let summary = writer.run().await?;

    if config.compact_output {
        tracing::info!("Skipping pretty-print for performance (set COMPACT_OUTPUT=false to enable)");
    } else {
        post_process::reformat_or_warn(&summary.path).await;
    }

    Ok(summary)
}
