//! Utility functions for timestamps, string handling, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Canonical ISO-8601 UTC rendering for publish and generation timestamps
//! - Whitespace collapsing and log-friendly truncation
//! - File system validation for the output directory

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS+00:00`.
///
/// Whole seconds and a fixed `+00:00` suffix keep every timestamp the same
/// width, so string order equals chronological order.
pub fn iso_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Current time, rendered with [`iso_utc`].
pub fn now_iso() -> String {
    iso_utc(Utc::now())
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).await?;

    // Try a small sync write using std fs (simpler error surface)
    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_utc_fixed_width() {
        let dt = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        assert_eq!(iso_utc(dt), "2025-05-06T14:30:00+00:00");

        let with_nanos = dt + chrono::Duration::milliseconds(123);
        assert_eq!(iso_utc(with_nanos), "2025-05-06T14:30:00+00:00");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "日".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"日".repeat(100)));
        assert!(result.ends_with("…(+400 chars)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let dir = std::env::temp_dir().join(format!("nfb_writable_{}", std::process::id()));
        let file = dir.join("nested").join("feed.json");
        ensure_writable_parent(&file).await.unwrap();
        assert!(dir.join("nested").is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
