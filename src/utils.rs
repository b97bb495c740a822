//! Utility functions for string handling, dates, and file system checks.

use crate::error::Result;
use chrono::{DateTime, TimeZone};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Longest file stem we produce, in bytes. Leaves room for an extension
/// within the common 255-byte filename limit.
pub const MAX_STEM_BYTES: usize = 240;

/// Largest index `<= max` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` bytes are cut at the nearest char boundary and
/// suffixed with `"…(+N bytes)"`.
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
    let end = floor_char_boundary(s, max);
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Render epoch seconds as `YYYY年MM月DD日` in `tz`.
///
/// Out-of-range timestamps are rendered as the raw number.
pub fn format_day<Tz>(epoch_secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(utc) => utc.with_timezone(tz).format("%Y年%m月%d日").to_string(),
        None => epoch_secs.to_string(),
    }
}

/// Replace characters that cannot appear in a path component.
///
/// Path separators, characters reserved on Windows and control characters
/// become `_`; surrounding whitespace and dots are dropped. No length cap.
pub fn clean_file_name(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced.trim().trim_matches('.').to_string()
}

/// Turn free text into a single path component capped at [`MAX_STEM_BYTES`].
pub fn sanitize_file_stem(text: &str) -> String {
    fit_file_stem(text, "")
}

/// Build a capped path component from `head` followed by `tail`.
///
/// `head` is shortened first so `tail` survives; `tail` is only cut when it
/// alone exceeds [`MAX_STEM_BYTES`].
pub fn fit_file_stem(head: &str, tail: &str) -> String {
    let tail = clean_file_name(tail);
    let head = clean_file_name(head);
    let budget = MAX_STEM_BYTES.saturating_sub(tail.len());
    let mut stem = head[..floor_char_boundary(&head, budget)].to_string();
    stem.push_str(&tail);
    let stem = clean_file_name(&stem[..floor_char_boundary(&stem, MAX_STEM_BYTES)]);
    if stem.is_empty() {
        return "untitled".to_string();
    }
    stem
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
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
        // Each of these characters is three bytes long.
        let result = truncate_for_log("量子位量子位", 4);
        assert_eq!(result, "量…(+15 bytes)");
    }

    #[test]
    fn test_format_day_in_offset() {
        let beijing = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(format_day(1643687857, &beijing), "2022年02月01日");
        let utc_minus_ten = FixedOffset::west_opt(10 * 3600).unwrap();
        assert_eq!(format_day(1643687857, &utc_minus_ten), "2022年01月31日");
    }

    #[test]
    fn test_format_day_out_of_range() {
        let beijing = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(format_day(i64::MAX, &beijing), i64::MAX.to_string());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(
            sanitize_file_stem("标题：http://mp.weixin.qq.com/s?a=1#rd"),
            "标题：http___mp.weixin.qq.com_s_a=1#rd"
        );
        assert_eq!(sanitize_file_stem("a\tb|c"), "a_b_c");
        assert_eq!(sanitize_file_stem("  ..  "), "untitled");
    }

    #[test]
    fn test_sanitize_file_stem_caps_length() {
        let long = "量".repeat(200);
        let stem = sanitize_file_stem(&long);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_eq!(stem.len() % 3, 0);
    }

    #[test]
    fn test_fit_file_stem_shortens_head_first() {
        let tail = "（量子位）_2649651589_1";
        let stem = fit_file_stem(&"量".repeat(200), tail);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert!(stem.starts_with("量"));
        assert!(stem.ends_with(tail));
        assert_eq!(fit_file_stem("短标题", tail), format!("短标题{tail}"));
        assert_eq!(fit_file_stem("", ""), "untitled");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("collected").join("nested");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
