//! Command-line interface definitions for Awful Vision News.
//!
//! Every option has a default so a bare invocation reads the built-in AI
//! section once. Service endpoints can also come from the environment.

use crate::perception::vision::DEFAULT_VISION_MODEL;
use clap::Parser;

/// Command-line arguments for the Awful Vision News application.
///
/// # Examples
///
/// ```sh
/// # One screenful of the default section
/// awful_vision_news
///
/// # Three scrolls per section, custom sections, overlays kept
/// awful_vision_news -s 3 --sections sections.yaml --debug
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of screenfuls to read per section
    #[arg(short, long, default_value_t = 1)]
    pub scrolls: usize,

    /// Report filename (defaults to output_<timestamp>.json)
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Directory the report is written to
    #[arg(long, default_value = "outputs")]
    pub output_dir: String,

    /// Verbose logging and OCR overlay images
    #[arg(long)]
    pub debug: bool,

    /// Pages cleaned concurrently
    #[arg(short = 't', long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_threads: u16,

    /// Optional path to the text-generation config.yaml
    #[arg(short, long)]
    pub config: Option<String>,

    /// Chat template used to clean article text
    #[arg(long, default_value = "news_cleaner")]
    pub template: String,

    /// Optional YAML file mapping section names to topic URLs
    #[arg(long)]
    pub sections: Option<String>,

    /// Ollama server hosting the vision model
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Vision model used to read titles off screenshots
    #[arg(long, env = "VISION_MODEL", default_value = DEFAULT_VISION_MODEL)]
    pub vision_model: String,

    /// Region OCR endpoint
    #[arg(long, env = "OCR_URL", default_value = "http://localhost:8000/ocr")]
    pub ocr_url: String,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Browser viewport width in pixels
    #[arg(long, default_value_t = 1050)]
    pub viewport_width: u32,

    /// Browser viewport height in pixels
    #[arg(long, default_value_t = 900)]
    pub viewport_height: u32,

    /// Seconds to wait for a click to open an article
    #[arg(long, default_value_t = 30)]
    pub page_timeout_secs: u64,

    /// Root of the screenshot cache
    #[arg(long, default_value = "cache")]
    pub cache_dir: String,

    /// Delete screenshots left by earlier runs before starting
    #[arg(long)]
    pub clear_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["awful_vision_news"]);

        assert_eq!(cli.scrolls, 1);
        assert_eq!(cli.max_threads, 3);
        assert_eq!(cli.output_dir, "outputs");
        assert_eq!(cli.template, "news_cleaner");
        assert_eq!(cli.cache_dir, "cache");
        assert_eq!((cli.viewport_width, cli.viewport_height), (1050, 900));
        assert_eq!(cli.page_timeout_secs, 30);
        assert!(cli.output_file.is_none());
        assert!(!cli.debug);
        assert!(!cli.headless);
        assert!(!cli.clear_cache);
        assert_eq!(cli.vision_model, DEFAULT_VISION_MODEL);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "awful_vision_news",
            "-s",
            "4",
            "-o",
            "report.json",
            "-t",
            "8",
            "-c",
            "/tmp/config.yaml",
        ]);

        assert_eq!(cli.scrolls, 4);
        assert_eq!(cli.output_file.as_deref(), Some("report.json"));
        assert_eq!(cli.max_threads, 8);
        assert_eq!(cli.config.as_deref(), Some("/tmp/config.yaml"));
    }

    #[test]
    fn test_cli_rejects_zero_threads() {
        assert!(Cli::try_parse_from(["awful_vision_news", "--max-threads", "0"]).is_err());
    }
}
