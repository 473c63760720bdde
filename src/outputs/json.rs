//! JSON report output.
//!
//! The report is a single object keyed by section name, each value the list
//! of articles read from that section in capture order:
//!
//! ```json
//! {"AI": [{"url": "https://...", "title": "...", "text": "..."}]}
//! ```

use crate::models::NewsReport;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`NewsReport`] to `output_dir/file_name` and return the path.
#[instrument(level = "info", skip(report), fields(sections = report.len()))]
pub async fn write_report(
    report: &NewsReport,
    output_dir: &str,
    file_name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let dir = Path::new(output_dir);
    if let Err(e) = ensure_writable_dir(dir).await {
        error!(path = %output_dir, error = %e, "Output directory is not writable");
        return Err(e);
    }

    let json = serde_json::to_string_pretty(report)?;
    let path = dir.join(file_name);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;

    #[tokio::test]
    async fn test_write_report_keeps_sections_and_order() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("outputs");
        let mut report = NewsReport::new();
        report.insert(
            "AI".to_string(),
            vec![
                Article {
                    url: "https://a.example/1".into(),
                    title: "First".into(),
                    text: "one".into(),
                },
                Article {
                    url: "https://b.example/2".into(),
                    title: "Second".into(),
                    text: String::new(),
                },
            ],
        );
        report.insert("Science".to_string(), Vec::new());

        let path = write_report(&report, out.to_str().unwrap(), "report.json")
            .await
            .unwrap();

        assert_eq!(path, out.join("report.json"));
        let back: NewsReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
        assert_eq!(back["AI"][1].title, "Second");
        assert!(back["Science"].is_empty());
    }
}
