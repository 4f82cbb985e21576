//! Common test utilities for asrm-export integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use asrm_export::Config;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Token accepted by every mock server in these tests
pub const TEST_TOKEN: &str = "test-token-123";

/// Config pointing at a mock server, writing into `dir`, with millisecond backoff
#[allow(dead_code)]
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        token: Some(TEST_TOKEN.to_string()),
        base_url: base_url.parse().expect("mock server URL is valid"),
        log_every: 1,
        timeout_secs: 5,
        max_retries: 2,
        backoff_base: 2.0,
        backoff_unit: Duration::from_millis(5),
        output_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

/// Parse the output file as a JSON array
#[allow(dead_code)]
pub fn read_array(path: &Path) -> Vec<Value> {
    let raw = std::fs::read(path).expect("output file exists");
    serde_json::from_slice(&raw).expect("output is a JSON array")
}
