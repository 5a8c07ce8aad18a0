//! Utility functions for time, string manipulation, URLs and the file system.
//!
//! This module provides helper functions used throughout the application:
//! - An injectable [`Clock`] and ISO-8601 formatting for article dates
//! - String truncation for logging remote payloads
//! - URL classification for deciding whether an article page is fetchable
//! - File system preparation for the output file

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

/// Source of "now" for entries without a structured publish time.
///
/// Production code uses [`SystemClock`]; tests pin time with a fixed clock.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The process clock, in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a timestamp as a zero-padded ISO-8601 UTC string.
///
/// Every stored `date` goes through this function, which is what makes a
/// plain lexicographic comparison of dates a valid chronological one.
///
/// # Examples
///
/// ```ignore
/// // 2025-05-06T14:30:00Z
/// let s = to_iso8601(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap());
/// ```
pub fn to_iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or below `max`
/// bytes and an ellipsis with the number of dropped bytes is appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Whether `link` is an absolute `http`/`https` URL worth requesting.
///
/// The `#` placeholder, relative paths and other schemes are not.
pub fn is_fetchable_url(link: &str) -> bool {
    Url::parse(link.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Resolve a possibly relative URL against `base`.
///
/// Absolute URLs are returned as-is; relative ones are joined onto `base`
/// when `base` is itself absolute, otherwise returned unchanged.
pub fn resolve_url(candidate: &str, base: &str) -> String {
    let candidate = candidate.trim();
    if Url::parse(candidate).is_ok() {
        return candidate.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(candidate))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| candidate.to_string())
}

/// Ensure the directory that will hold `path` exists.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created
/// (permission denied, read-only filesystem, a file in the way, etc.).
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // "é" is two bytes; cutting at 3 would split the second one.
        let result = truncate_for_log("éééé", 3);
        assert!(result.starts_with("é…"));
        assert!(result.contains("(+6 bytes)"));
    }

    #[test]
    fn test_to_iso8601_is_zero_padded_utc() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(to_iso8601(dt), "2025-01-02T03:04:05Z");
    }

    #[test]
    fn test_iso8601_orders_lexicographically() {
        let earlier = to_iso8601(Utc.with_ymd_and_hms(2025, 9, 30, 23, 0, 0).unwrap());
        let later = to_iso8601(Utc.with_ymd_and_hms(2025, 10, 1, 1, 0, 0).unwrap());
        assert!(later > earlier);
    }

    #[test]
    fn test_is_fetchable_url() {
        assert!(is_fetchable_url("https://bitcoinmagazine.com/markets/x"));
        assert!(is_fetchable_url("http://example.com"));
        assert!(!is_fetchable_url("#"));
        assert!(!is_fetchable_url("/relative/path"));
        assert!(!is_fetchable_url("mailto:someone@example.com"));
        assert!(!is_fetchable_url(""));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://cdn.example.com/a.jpg", "https://example.com/post"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            resolve_url("/img/a.jpg", "https://example.com/post/1"),
            "https://example.com/img/a.jpg"
        );
        assert_eq!(resolve_url("/img/a.jpg", "#"), "/img/a.jpg");
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data/nested/news.json");
        ensure_parent_dir(&path).await.unwrap();
        assert!(tmp.path().join("data/nested").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("news.json")).await.unwrap();
    }
}
