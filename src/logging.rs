//! Logging setup for the binary
//!
//! Progress goes to standard output. `RUST_LOG` overrides the default `info` level.

use crate::config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber
pub fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().with_target(false).json().with_writer(std::io::stdout))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stdout))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
            .try_init()?,
    }

    Ok(())
}
