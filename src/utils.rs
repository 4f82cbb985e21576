//! Utility functions for output naming and progress formatting

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix shared by every output file
pub const OUTPUT_PREFIX: &str = "vulnerable_devices_";

/// Name of the output file for a run started at `started`
///
/// Minute resolution: runs started in different minutes never collide.
///
/// # Examples
///
/// ```
/// use asrm_export::utils::output_file_name;
/// use chrono::{Local, TimeZone};
///
/// let started = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
/// assert_eq!(output_file_name(started), "vulnerable_devices_20240309_0705.json");
/// ```
pub fn output_file_name(started: DateTime<Local>) -> String {
    format!("{OUTPUT_PREFIX}{}.json", started.format("%Y%m%d_%H%M"))
}

/// Full output path inside `dir`
pub fn output_path(dir: &Path, started: DateTime<Local>) -> PathBuf {
    dir.join(output_file_name(started))
}

/// Format an elapsed duration for progress lines
///
/// - under a minute: `12.3s`
/// - under an hour: `4m05s`
/// - otherwise: `1h02m03s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let whole = elapsed.as_secs();
    let (minutes, seconds) = (whole / 60, whole % 60);
    if minutes < 60 {
        return format!("{minutes}m{seconds:02}s");
    }
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{hours}h{minutes:02}m{seconds:02}s")
}

/// Items per second, or zero before any time has passed
pub fn throughput(items: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { items as f64 / secs } else { 0.0 }
}
