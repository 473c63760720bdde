//! Drives one topic page through its scrolls and captures article tabs.
//!
//! The tracked topic tab is the single piece of shared mutable state in a
//! run: every scroll, screenshot and click goes through the one
//! [`SectionNavigator`] that owns it, strictly in sequence.

use crate::browser::{BrowserDriver, BrowserError, OriginFilter, TabDriver};
use crate::context::{RunContext, section_image_name};
use crate::models::{ClickPoint, RawPage};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Timing knobs for navigation.
#[derive(Debug, Clone)]
pub struct NavigationSettings {
    /// How long to wait for a click to open an external article tab.
    pub new_page_timeout: Duration,
    /// Pause after scrolling so lazy content can render.
    pub scroll_pause: Duration,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            new_page_timeout: Duration::from_secs(30),
            scroll_pause: Duration::from_secs(1),
        }
    }
}

/// Navigation state for one section.
pub struct SectionNavigator<'a, B: BrowserDriver> {
    browser: &'a B,
    tab: B::Tab,
    origin: OriginFilter,
    viewport_height: u32,
    seen_urls: HashSet<String>,
    settings: NavigationSettings,
}

impl<'a, B: BrowserDriver> SectionNavigator<'a, B> {
    /// Open the section URL in a new tab and wait for it to load.
    #[instrument(level = "info", skip(browser, settings))]
    pub async fn open(
        browser: &'a B,
        section_url: &str,
        settings: NavigationSettings,
    ) -> Result<Self, BrowserError> {
        let origin = OriginFilter::for_url(section_url)?;
        let tab = browser.new_tab().await?;
        tab.goto(section_url).await?;
        tab.wait_for_load().await?;
        let viewport_height = tab.viewport_height().await?;
        info!(origin = origin.origin_host(), viewport_height, "Section page loaded");

        Ok(Self {
            browser,
            tab,
            origin,
            viewport_height,
            seen_urls: HashSet::new(),
            settings,
        })
    }

    /// Bring the topic tab forward, scroll for every scroll after the first,
    /// and save a screenshot named after the scroll index.
    #[instrument(level = "info", skip(self, ctx))]
    pub async fn capture_scroll(
        &self,
        scroll: usize,
        ctx: &RunContext,
    ) -> Result<PathBuf, BrowserError> {
        self.tab.bring_to_front().await?;
        if scroll > 0 {
            self.tab.wheel(f64::from(self.viewport_height)).await?;
            tokio::time::sleep(self.settings.scroll_pause).await;
        }

        let path = ctx.cache.file(&section_image_name(scroll));
        self.tab.screenshot(&path).await?;
        debug!(path = %path.display(), "Saved screenshot");
        Ok(path)
    }

    /// Click each point in order and capture the external tabs they open.
    ///
    /// A click that opens no qualifying tab in time is skipped. A URL already
    /// captured in this section is never captured again.
    #[instrument(level = "info", skip_all, fields(points = points.len()))]
    pub async fn visit(&mut self, points: &[ClickPoint]) -> Result<Vec<RawPage>, BrowserError> {
        let mut raw_pages = Vec::new();

        for point in points {
            debug!(x = point.x, y = point.y, "Clicking");
            let known = self.browser.tab_ids().await?;
            self.tab.click(point.x as f64, point.y as f64).await?;

            let opened = self
                .browser
                .wait_for_new_tab(&known, &self.origin, self.settings.new_page_timeout)
                .await?;
            let Some(new_tab) = opened else {
                error!(
                    x = point.x,
                    y = point.y,
                    timeout_ms = self.settings.new_page_timeout.as_millis() as u64,
                    "No page opened after clicking"
                );
                self.close_tabs_opened_since(&known).await?;
                self.tab.bring_to_front().await?;
                continue;
            };

            let url = new_tab.url().await?;
            debug!(%url, "Opened new page");
            if self.seen_urls.contains(&url) {
                debug!(%url, "Already opened this URL, skipping");
            } else {
                new_tab.bring_to_front().await?;
                let html = new_tab.content().await?;
                self.seen_urls.insert(url.clone());
                raw_pages.push(RawPage { url, html });
            }

            new_tab.close().await?;
            self.tab.bring_to_front().await?;
        }

        Ok(raw_pages)
    }

    /// Close tabs that appeared after `known` was taken but never qualified.
    async fn close_tabs_opened_since(&self, known: &HashSet<String>) -> Result<(), BrowserError> {
        for tab in self.browser.tabs().await? {
            if known.contains(&tab.id()) {
                continue;
            }
            let url = tab.url().await.unwrap_or_default();
            debug!(%url, "Closing tab that did not leave the site");
            if let Err(e) = tab.close().await {
                warn!(%url, error = %e, "Failed to close stray tab");
            }
        }
        Ok(())
    }

    /// Give back the topic tab once the section is done.
    pub async fn finish(self) -> Result<(), BrowserError> {
        self.tab.close().await
    }
}
