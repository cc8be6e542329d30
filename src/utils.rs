//! Small helpers for text normalization, log previews and output naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::OutputFormat;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trim a string and collapse every internal whitespace run to one space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Hello \n  world "), "Hello world");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (moved back to a char boundary) with
/// an ellipsis and the number of dropped bytes appended.
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

/// The `YYYYMMDD_HHMMSS` stamp used in output file names.
pub fn file_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Build the naming function handed to the sink:
/// `<dir>/news_headlines_<YYYYMMDD_HHMMSS>.<ext>`.
pub fn timestamped_namer(
    dir: &Path,
    at: &DateTime<Local>,
) -> impl Fn(OutputFormat) -> PathBuf + use<> {
    let dir = dir.to_path_buf();
    let stamp = file_timestamp(at);
    move |format| dir.join(format!("news_headlines_{}.{}", stamp, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello \n  world "), "Hello world");
        assert_eq!(collapse_whitespace("\t\n "), "");
        assert_eq!(collapse_whitespace("one"), "one");
    }

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
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("é…"));
    }

    #[test]
    fn test_timestamped_namer() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let namer = timestamped_namer(Path::new("/tmp/out"), &at);
        assert_eq!(
            namer(OutputFormat::Text),
            PathBuf::from("/tmp/out/news_headlines_20240309_070501.txt")
        );
        assert_eq!(
            namer(OutputFormat::Json),
            PathBuf::from("/tmp/out/news_headlines_20240309_070501.json")
        );
    }
}
