//! Optional pretty-printing of a finished export
//!
//! The stream writer always produces compact output. When indented output is
//! requested the whole file is loaded once and rewritten. The rewrite goes to a
//! sibling temporary file that replaces the original only after it is fully
//! written, so a failure leaves the compact file untouched.

use crate::error::Result;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rewrite the JSON document at `path` with two-space indentation
///
/// Key order and non-ASCII text are preserved.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read or replaced and
/// `Error::Serialization` if it is not a single valid JSON document.
pub async fn reformat(path: &Path) -> Result<()> {
    let raw = tokio::fs::read(path).await?;
    let document: Value = serde_json::from_slice(&raw)?;
    drop(raw);

    let mut pretty = serde_json::to_vec_pretty(&document)?;
    pretty.push(b'\n');

    let staging = staging_path(path);
    if let Err(e) = tokio::fs::write(&staging, &pretty).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}

/// Reformat `path`, logging a warning instead of failing
///
/// Returns `true` if the file was rewritten.
pub async fn reformat_or_warn(path: &Path) -> bool {
    info!(path = %path.display(), "Reformatting JSON (pretty print)");
    match reformat(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Could not reformat JSON, keeping compact output"
            );
            false
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}
