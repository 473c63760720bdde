//! Small helpers for logging and the file system.

use chrono::{DateTime, Local};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (moved back to a char boundary) and
/// get an ellipsis plus the number of dropped bytes appended.
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

/// Default report filename for a run started at `at`.
pub fn default_output_filename(at: DateTime<Local>) -> String {
    format!("output_{}.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
        let s = "ééééé";
        assert_eq!(truncate_for_log(s, 3), "é…(+8 bytes)");
    }

    #[test]
    fn test_default_output_filename() {
        let at = Local.with_ymd_and_hms(2024, 11, 3, 9, 5, 7).unwrap();
        assert_eq!(default_output_filename(at), "output_2024-11-03_09-05-07.json");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_it() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("outputs/nested");
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("..__write_check__").exists());
    }
}
