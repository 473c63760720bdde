//! Chromium over the DevTools Protocol via `chromiumoxide`.

use super::{BrowserDriver, BrowserError, OriginFilter, TabDriver};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{BringToFrontParams, CaptureScreenshotFormat};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const NEW_TAB_POLL: Duration = Duration::from_millis(250);

/// Launch options for [`ChromiumBrowser`].
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            width: 1050,
            height: 900,
        }
    }
}

/// A launched Chromium with its CDP event loop.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    #[instrument(level = "info", skip_all, fields(headless = settings.headless, width = settings.width, height = settings.height))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.width, settings.height)
            .viewport(Viewport {
                width: settings.width,
                height: settings.height,
                ..Default::default()
            });
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Config)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        info!("Browser launched");
        Ok(Self { browser, handler })
    }

    /// Close the browser and stop its event loop.
    pub async fn shutdown(mut self) -> Result<(), BrowserError> {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Waiting for browser exit failed");
        }
        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }
}

/// One Chromium tab.
#[derive(Debug, Clone)]
pub struct ChromiumTab {
    page: Page,
}

impl ChromiumTab {
    async fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> Result<(), BrowserError> {
        let mut params = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
        if kind != DispatchMouseEventType::MouseMoved {
            params = params.button(MouseButton::Left).click_count(1);
        }
        self.page
            .execute(params.build().map_err(BrowserError::Other)?)
            .await?;
        Ok(())
    }

    async fn viewport(&self) -> Result<(f64, f64), BrowserError> {
        let size: Vec<f64> = self
            .page
            .evaluate("[window.innerWidth, window.innerHeight]")
            .await?
            .into_value()
            .map_err(|e| BrowserError::Other(format!("unreadable viewport size: {e}")))?;
        match size.as_slice() {
            [w, h] => Ok((*w, *h)),
            _ => Err(BrowserError::Other("unreadable viewport size".to_string())),
        }
    }
}

impl TabDriver for ChromiumTab {
    fn id(&self) -> String {
        self.page.target_id().inner().clone()
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn wait_for_load(&self) -> Result<(), BrowserError> {
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn bring_to_front(&self) -> Result<(), BrowserError> {
        self.page.execute(BringToFrontParams::default()).await?;
        Ok(())
    }

    async fn viewport_height(&self) -> Result<u32, BrowserError> {
        let (_, h) = self.viewport().await?;
        Ok(h.round() as u32)
    }

    async fn wheel(&self, delta_y: f64) -> Result<(), BrowserError> {
        let (w, h) = self.viewport().await?;
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(w / 2.0)
            .y(h / 2.0)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(BrowserError::Other)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn click(&self, x: f64, y: f64) -> Result<(), BrowserError> {
        self.mouse(DispatchMouseEventType::MouseMoved, x, y).await?;
        self.mouse(DispatchMouseEventType::MousePressed, x, y).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, x, y).await
    }

    async fn url(&self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.page.close().await?;
        Ok(())
    }
}

impl BrowserDriver for ChromiumBrowser {
    type Tab = ChromiumTab;

    async fn new_tab(&self) -> Result<ChromiumTab, BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromiumTab { page })
    }

    async fn tabs(&self) -> Result<Vec<ChromiumTab>, BrowserError> {
        let pages = self.browser.pages().await?;
        Ok(pages.into_iter().map(|page| ChromiumTab { page }).collect())
    }

    async fn wait_for_new_tab(
        &self,
        known: &HashSet<String>,
        filter: &OriginFilter,
        timeout: Duration,
    ) -> Result<Option<ChromiumTab>, BrowserError> {
        let poll = async {
            loop {
                for page in self.browser.pages().await? {
                    if known.contains(page.target_id().inner()) {
                        continue;
                    }
                    match page.url().await {
                        Ok(Some(url)) if filter.is_external(&url) => {
                            return Ok::<_, BrowserError>(ChromiumTab { page });
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Could not read URL of new tab"),
                    }
                }
                tokio::time::sleep(NEW_TAB_POLL).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(tab) => tab.map(Some),
            Err(_) => Ok(None),
        }
    }
}
