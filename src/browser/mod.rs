//! Browser collaborator seen from the pipeline.
//!
//! The pipeline only needs a handful of operations: open a tab, scroll it,
//! photograph it, click on it, and notice when a click opened another tab.
//! [`BrowserDriver`] and [`TabDriver`] describe exactly that;
//! [`chromium::ChromiumBrowser`] implements them over the Chrome DevTools
//! Protocol.

pub mod chromium;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("invalid browser configuration: {0}")]
    Config(String),
    #[error("devtools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// One browser tab.
pub trait TabDriver {
    /// Stable identifier of the tab within its browser.
    fn id(&self) -> String;
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;
    async fn wait_for_load(&self) -> Result<(), BrowserError>;
    async fn bring_to_front(&self) -> Result<(), BrowserError>;
    async fn viewport_height(&self) -> Result<u32, BrowserError>;
    /// Scroll with the mouse wheel by `delta_y` pixels.
    async fn wheel(&self, delta_y: f64) -> Result<(), BrowserError>;
    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;
    async fn click(&self, x: f64, y: f64) -> Result<(), BrowserError>;
    async fn url(&self) -> Result<String, BrowserError>;
    async fn content(&self) -> Result<String, BrowserError>;
    async fn close(self) -> Result<(), BrowserError>;
}

/// A browser that owns tabs.
pub trait BrowserDriver {
    type Tab: TabDriver;

    async fn new_tab(&self) -> Result<Self::Tab, BrowserError>;

    /// All tabs open right now.
    async fn tabs(&self) -> Result<Vec<Self::Tab>, BrowserError>;

    /// Identifiers of all tabs open right now.
    async fn tab_ids(&self) -> Result<HashSet<String>, BrowserError> {
        Ok(self.tabs().await?.iter().map(TabDriver::id).collect())
    }

    /// Wait for a tab not in `known` whose URL passes `filter`.
    ///
    /// Returns `Ok(None)` when no such tab shows up within `timeout`.
    async fn wait_for_new_tab(
        &self,
        known: &HashSet<String>,
        filter: &OriginFilter,
        timeout: Duration,
    ) -> Result<Option<Self::Tab>, BrowserError>;
}

/// Host of a URL, or an empty string when it has none.
pub fn domain_of_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Accepts URLs that leave the origin site.
///
/// A URL qualifies when it is http(s), has a host, and that host is neither
/// the origin host nor one of its subdomains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginFilter {
    origin_host: String,
}

impl OriginFilter {
    pub fn new(origin_host: impl Into<String>) -> Self {
        Self {
            origin_host: origin_host.into().to_lowercase(),
        }
    }

    /// Filter for the site serving `url`.
    pub fn for_url(url: &str) -> Result<Self, BrowserError> {
        let host = domain_of_url(url);
        if host.is_empty() {
            return Err(BrowserError::Config(format!("no host in section URL {url}")));
        }
        Ok(Self::new(host))
    }

    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    pub fn is_external(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        match parsed.host_str() {
            Some(host) => {
                let host = host.to_lowercase();
                host != self.origin_host && !host.ends_with(&format!(".{}", self.origin_host))
            }
            None => false,
        }
    }
}
