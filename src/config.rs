//! Configuration types for asrm-export
//!
//! All settings are read once at startup from command-line flags or their
//! environment variables and passed explicitly to each component.
//!
//! # Example
//!
//! ```no_run
//! use asrm_export::Config;
//! use clap::Parser;
//!
//! let config = Config::parse();
//! let token = config.bearer_token()?;
//! # Ok::<(), asrm_export::Error>(())
//! ```

use crate::error::{Error, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Vulnerable-devices endpoint queried when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://api.xdr.trendmicro.com/v3.0/asrm/vulnerableDevices";

/// Token values shipped in sample configurations; treated as "not configured"
pub const PLACEHOLDER_TOKENS: [&str; 2] = ["<PUT_YOUR_BEARER_TOKEN_HERE>", "<API key here>"];

/// Page sizes the remote API accepts for the `top` query parameter
pub const ACCEPTED_PAGE_SIZES: [u32; 4] = [10, 50, 100, 200];

/// Environment variable holding the bearer token
pub const TOKEN_ENV: &str = "TM_API_TOKEN";

const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Number of items requested per page (`top`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    /// Create a page size, rejecting values the API does not accept
    pub fn new(size: u32) -> Result<Self> {
        if ACCEPTED_PAGE_SIZES.contains(&size) {
            Ok(Self(size))
        } else {
            Err(Error::config(
                format!("page size {size} is not one of {ACCEPTED_PAGE_SIZES:?}"),
                "PAGE_SIZE",
            ))
        }
    }

    /// The raw value sent as `top`
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(200)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let size: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number"))?;
        PageSize::new(size).map_err(|e| e.to_string())
    }
}

/// Log line layout for the stdout subscriber
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable output (default)
    #[default]
    Text,
    /// Multi-line human readable output
    Pretty,
    /// One JSON object per line
    Json,
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt (default: 5)
    pub max_retries: u32,

    /// Base raised to the attempt number to get the backoff (default: 1.5)
    pub backoff_base: f64,

    /// Duration the backoff exponent is scaled by (default: 1 second)
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: 1.5,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff before retry number `attempt` (1-based), no jitter
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_unit.as_secs_f64() * self.backoff_base.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Export configuration loaded from CLI args and environment variables
#[derive(Clone, Debug, Parser)]
#[command(
    name = "asrm-export",
    about = "Stream every vulnerable device record into a local JSON file",
    version
)]
pub struct Config {
    /// Bearer token for the API
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Endpoint of the first page
    #[arg(long, env = "ASRM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Items per page, one of 10, 50, 100, 200
    #[arg(long, env = "PAGE_SIZE", default_value_t = PageSize::default())]
    pub page_size: PageSize,

    /// Log progress on the first page and every N pages after
    #[arg(
        long,
        env = "LOG_EVERY",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub log_every: u64,

    /// Keep the compact output instead of re-indenting it after the run
    #[arg(
        long,
        env = "COMPACT_OUTPUT",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub compact_output: bool,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_SECS",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Retries allowed per page after the first attempt
    #[arg(long, env = "MAX_RETRIES", default_value_t = 5)]
    pub max_retries: u32,

    /// Base of the exponential backoff, in seconds
    #[arg(long, env = "BACKOFF_BASE", default_value_t = 1.5, value_parser = parse_backoff_base)]
    pub backoff_base: f64,

    /// Directory the output file is created in
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Scale applied to the backoff; not exposed on the command line
    #[arg(skip = DEFAULT_BACKOFF_UNIT)]
    pub backoff_unit: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            token: None,
            base_url: default_base_url(),
            page_size: PageSize::default(),
            log_every: 5,
            compact_output: true,
            timeout_secs: 20,
            max_retries: retry.max_retries,
            backoff_base: retry.backoff_base,
            output_dir: PathBuf::from("."),
            log_format: LogFormat::default(),
            backoff_unit: retry.backoff_unit,
        }
    }
}

impl Config {
    /// The configured bearer token
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the token is missing, blank, or still a placeholder.
    pub fn bearer_token(&self) -> Result<&str> {
        let token = self.token.as_deref().map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(Error::config(
                format!("set {TOKEN_ENV} or pass --token"),
                TOKEN_ENV,
            ));
        }
        if PLACEHOLDER_TOKENS.contains(&token) {
            return Err(Error::config(
                format!("{TOKEN_ENV} still holds the placeholder value"),
                TOKEN_ENV,
            ));
        }
        Ok(token)
    }

    /// Check every setting that the parser cannot enforce on its own
    pub fn validate(&self) -> Result<()> {
        self.bearer_token()?;
        if self.log_every == 0 {
            return Err(Error::config("log_every must be at least 1", "LOG_EVERY"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config(
                "request timeout must be at least 1 second",
                "REQUEST_TIMEOUT_SECS",
            ));
        }
        if !(self.backoff_base.is_finite() && self.backoff_base > 0.0) {
            return Err(Error::config(
                "backoff base must be a positive number",
                "BACKOFF_BASE",
            ));
        }
        Ok(())
    }

    /// Retry policy shared by every page request of the run
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            backoff_unit: self.backoff_unit,
        }
    }

    /// Timeout applied to each request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

fn parse_backoff_base(s: &str) -> std::result::Result<f64, String> {
    let base: f64 = s.trim().parse().map_err(|_| format!("'{s}' is not a number"))?;
    if base.is_finite() && base > 0.0 {
        Ok(base)
    } else {
        Err(format!("backoff base must be positive, got {s}"))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Config, clap::Error> {
        let mut argv = vec!["asrm-export", "--token", "abc123"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv)
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.page_size.get(), 200);
        assert_eq!(config.log_every, 5);
        assert!(config.compact_output);
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.retry(), RetryConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::default().bearer_token().unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key.as_deref() == Some(TOKEN_ENV)));
    }

    #[test]
    fn blank_and_placeholder_tokens_are_rejected() {
        for token in ["", "   ", "<PUT_YOUR_BEARER_TOKEN_HERE>", " <API key here> "] {
            let config = Config {
                token: Some(token.to_string()),
                ..Config::default()
            };
            assert!(
                config.bearer_token().is_err(),
                "token {token:?} should be rejected"
            );
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn real_token_is_trimmed() {
        let config = Config {
            token: Some("  eyJhbGciOi  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.bearer_token().unwrap(), "eyJhbGciOi");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_numbers_from_code_paths() {
        let base = Config {
            token: Some("t".into()),
            ..Config::default()
        };
        assert!(Config { log_every: 0, ..base.clone() }.validate().is_err());
        assert!(Config { timeout_secs: 0, ..base.clone() }.validate().is_err());
        assert!(Config { backoff_base: 0.0, ..base.clone() }.validate().is_err());
        assert!(Config { backoff_base: f64::NAN, ..base }.validate().is_err());
    }

    #[test]
    fn page_size_accepts_only_api_values() {
        for size in ACCEPTED_PAGE_SIZES {
            assert_eq!(size.to_string().parse::<PageSize>().unwrap().get(), size);
        }
        assert!("25".parse::<PageSize>().is_err());
        assert!("0".parse::<PageSize>().is_err());
        assert!("many".parse::<PageSize>().is_err());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let config = parse(&[
            "--page-size",
            "50",
            "--log-every",
            "10",
            "--compact-output",
            "false",
            "--max-retries",
            "2",
            "--backoff-base",
            "2",
            "--base-url",
            "http://127.0.0.1:9000/v3.0/asrm/vulnerableDevices",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.page_size.get(), 50);
        assert_eq!(config.log_every, 10);
        assert!(!config.compact_output);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_base, 2.0);
        assert_eq!(config.base_url.port(), Some(9000));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn cli_rejects_invalid_values() {
        assert!(parse(&["--page-size", "25"]).is_err());
        assert!(parse(&["--log-every", "0"]).is_err());
        assert!(parse(&["--backoff-base", "-1"]).is_err());
        assert!(parse(&["--base-url", "not a url"]).is_err());
        assert!(parse(&["--compact-output", "maybe"]).is_err());
    }

    #[test]
    fn compact_output_accepts_boolish_values() {
        assert!(!parse(&["--compact-output", "no"]).unwrap().compact_output);
        assert!(parse(&["--compact-output", "1"]).unwrap().compact_output);
    }

    #[test]
    fn backoff_grows_exponentially_without_jitter() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_for(1), Duration::from_secs_f64(1.5));
        assert_eq!(retry.backoff_for(2), Duration::from_secs_f64(2.25));
        assert_eq!(retry.backoff_for(3), Duration::from_secs_f64(3.375));
    }

    #[test]
    fn backoff_unit_scales_delay() {
        let retry = RetryConfig {
            max_retries: 3,
            backoff_base: 2.0,
            backoff_unit: Duration::from_millis(10),
        };
        assert_eq!(retry.backoff_for(1), Duration::from_millis(20));
        assert_eq!(retry.backoff_for(3), Duration::from_millis(80));
    }
}
