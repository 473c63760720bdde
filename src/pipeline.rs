//! The `get_news` run: sections, scrolls, clicks and cleaning.
//!
//! Sections run one after another because they share one browser. Within a
//! scroll everything touching the browser is sequential; only cleaning of
//! the already captured pages runs concurrently, bounded by `max_threads`,
//! and its results come back in capture order.

use crate::api::AskAsync;
use crate::browser::{BrowserDriver, BrowserError};
use crate::cleaner::{ContentCleaner, extract_page_text};
use crate::context::RunContext;
use crate::models::{Article, NewsReport, RawPage};
use crate::navigator::{NavigationSettings, SectionNavigator};
use crate::perception::{ScreenshotAnalyzer, TextLocalizer, TitleDetector};
use crate::sections::Section;
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

/// Default width of the cleaning pool.
pub const DEFAULT_MAX_THREADS: usize = 3;

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Scroll steps per section; the first step does not scroll.
    pub scrolls: usize,
    /// Pages cleaned at once.
    pub max_threads: usize,
    pub navigation: NavigationSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scrolls: 1,
            max_threads: DEFAULT_MAX_THREADS,
            navigation: NavigationSettings::default(),
        }
    }
}

/// Clean captured pages concurrently, returning articles in input order.
///
/// A page whose cleaning fails still yields an article at its position,
/// with the page title and an empty body.
#[instrument(level = "info", skip_all, fields(pages = pages.len(), max_threads = max_threads))]
pub async fn clean_pages<T>(
    cleaner: &ContentCleaner<T>,
    pages: Vec<RawPage>,
    max_threads: usize,
) -> Vec<Article>
where
    T: AskAsync<Response = String>,
{
    stream::iter(pages)
        .map(|page| async move {
            match cleaner.clean(&page).await {
                Ok(article) => article,
                Err(e) => {
                    error!(url = %page.url, error = %e, "Cleaning failed; keeping article without text");
                    Article {
                        title: extract_page_text(&page.html).title,
                        url: page.url,
                        text: String::new(),
                    }
                }
            }
        })
        .buffered(max_threads.max(1))
        .collect()
        .await
}

/// Composes navigation, perception and cleaning over all sections.
pub struct NewsReader<'a, B, D, L, T> {
    browser: &'a B,
    analyzer: ScreenshotAnalyzer<D, L>,
    cleaner: ContentCleaner<T>,
    ctx: &'a RunContext,
}

impl<'a, B, D, L, T> NewsReader<'a, B, D, L, T>
where
    B: BrowserDriver,
    D: TitleDetector,
    L: TextLocalizer,
    T: AskAsync<Response = String>,
{
    pub fn new(
        browser: &'a B,
        analyzer: ScreenshotAnalyzer<D, L>,
        cleaner: ContentCleaner<T>,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            browser,
            analyzer,
            cleaner,
            ctx,
        }
    }

    /// Visit every section and collect its articles.
    #[instrument(level = "info", skip_all, fields(sections = sections.len(), scrolls = settings.scrolls))]
    pub async fn get_news(
        &self,
        sections: &[Section],
        settings: &RunSettings,
    ) -> Result<NewsReport, BrowserError> {
        let mut report = NewsReport::new();
        for section in sections {
            let articles = self.read_section(section, settings).await?;
            info!(section = %section.name, count = articles.len(), "Section done");
            report.insert(section.name.clone(), articles);
        }
        Ok(report)
    }

    #[instrument(level = "info", skip_all, fields(section = %section.name))]
    async fn read_section(
        &self,
        section: &Section,
        settings: &RunSettings,
    ) -> Result<Vec<Article>, BrowserError> {
        info!(url = %section.url, "Visiting section");
        let mut nav =
            SectionNavigator::open(self.browser, &section.url, settings.navigation.clone()).await?;
        let mut articles = Vec::new();

        for scroll in 0..settings.scrolls {
            let screenshot = nav.capture_scroll(scroll, self.ctx).await?;

            let points = self.analyzer.analyze(&screenshot).await;
            if points.is_empty() {
                warn!(screenshot = %screenshot.display(), "Found no titles to click in screenshot");
                continue;
            }

            let raw_pages = nav.visit(&points).await?;
            if raw_pages.is_empty() {
                warn!(scroll, "No pages opened");
                continue;
            }

            let cleaned = clean_pages(&self.cleaner, raw_pages, settings.max_threads).await;
            info!(
                count = cleaned.len(),
                scroll,
                scrolls = settings.scrolls,
                "Extracted articles from scroll"
            );
            articles.extend(cleaned);
        }

        nav.finish().await?;
        Ok(articles)
    }
}
