//! # Awful Vision News
//!
//! Discovers news articles by looking at a news aggregator the way a person
//! does: it screenshots each topic page, reads the headline titles off the
//! image with a vision model, locates them with region OCR, clicks them in a
//! real browser and has a text-generation model clean every article that
//! opens.
//!
//! ## Usage
//!
//! ```sh
//! awful_vision_news -s 2 --sections sections.yaml
//! ```
//!
//! ## Architecture
//!
//! For every section and every scroll:
//! 1. **Capture**: Scroll the topic tab one viewport and screenshot it
//! 2. **Perception**: Detect titles, OCR regions, filter and match them to click points
//! 3. **Navigation**: Click each point and capture the external article tabs it opens
//! 4. **Cleaning**: Clean captured pages in parallel (`--max-threads` at a time)
//!
//! The collected articles are written as one JSON report.

use awful_aj::{config, config_dir, template};
use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod browser;
mod cleaner;
mod cli;
mod context;
mod filter;
mod geometry;
mod matcher;
mod models;
mod navigator;
mod outputs;
mod perception;
mod pipeline;
mod sections;
mod utils;

#[cfg(test)]
mod testing;

use api::cleaning_client;
use browser::chromium::{BrowserSettings, ChromiumBrowser};
use cleaner::ContentCleaner;
use cli::Cli;
use context::{RunCache, RunContext};
use navigator::NavigationSettings;
use outputs::json;
use perception::ScreenshotAnalyzer;
use perception::ocr::RegionOcr;
use perception::vision::OllamaVision;
use pipeline::{NewsReader, RunSettings};
use sections::load_sections;
use utils::default_output_filename;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    let started_at = Local::now();

    // Parse CLI
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("awful_vision_news starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Run context ----
    let cache = RunCache::create(&args.cache_dir)?;
    if args.clear_cache {
        cache.clear(true)?;
    }
    info!(directory = %cache.directory().display(), "Screenshot cache ready");
    let ctx = RunContext::new(cache, args.debug);

    let sections = load_sections(args.sections.as_deref()).await?;

    // ---- Load template & config ----
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml").display().to_string(),
    };
    let config = config::load_config(&config_path)?;
    info!(%config_path, "Loaded configuration");

    // ---- Pipeline parts ----
    let cleaner = ContentCleaner::new(cleaning_client(&config, &template));
    let analyzer = ScreenshotAnalyzer::new(
        OllamaVision::new(&args.ollama_url, &args.vision_model),
        RegionOcr::new(&args.ocr_url, &ctx),
    );
    let settings = RunSettings {
        scrolls: args.scrolls,
        max_threads: usize::from(args.max_threads),
        navigation: NavigationSettings {
            new_page_timeout: Duration::from_secs(args.page_timeout_secs),
            ..NavigationSettings::default()
        },
    };

    let browser = ChromiumBrowser::launch(&BrowserSettings {
        headless: args.headless,
        width: args.viewport_width,
        height: args.viewport_height,
    })
    .await?;

    let result = NewsReader::new(&browser, analyzer, cleaner, &ctx)
        .get_news(&sections, &settings)
        .await;
    browser.shutdown().await?;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    // ---- Output ----
    let file_name = args
        .output_file
        .clone()
        .unwrap_or_else(|| default_output_filename(started_at));
    let path = json::write_report(&report, &args.output_dir, &file_name).await?;

    let elapsed = start_time.elapsed();
    info!(
        path = %path.display(),
        articles = report.values().map(Vec::len).sum::<usize>(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Done"
    );

    Ok(())
}
