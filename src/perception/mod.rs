//! Model-driven perception over viewport screenshots.
//!
//! Two capabilities run on every screenshot:
//!
//! - [`TitleDetector`]: a vision-language model lists the article titles it
//!   can see ([`vision::OllamaVision`])
//! - [`TextLocalizer`]: region OCR returns every piece of visible text with a
//!   four-corner box ([`ocr::RegionOcr`])
//!
//! Both return a [`Detection`]. A failed model call is logged inside the
//! stage and reported as [`Detection::Empty`], never as an error, so one bad
//! screenshot only costs its own scroll.
//!
//! [`ScreenshotAnalyzer`] chains the two with the span filter and the title
//! matcher to produce click points.

pub mod ocr;
pub mod overlay;
pub mod vision;

use crate::filter::filter_title_spans;
use crate::matcher::match_titles;
use crate::models::{ClickPoint, TextSpan};
use itertools::Itertools;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// Outcome of a perception call on one screenshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection<T> {
    Detected(T),
    Empty,
}

impl<T> Detection<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Detection::Detected(value) => Some(value),
            Detection::Empty => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("failed to read screenshot {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model output is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("model output failed validation: {0}")]
    Validation(String),
    #[error("response is missing the `{0}` result")]
    MissingTask(String),
    #[error("quad {index} has {len} coordinates, expected 8")]
    MalformedQuad { index: usize, len: usize },
    #[error("{labels} labels but {boxes} boxes in OCR result")]
    LengthMismatch { labels: usize, boxes: usize },
}

/// Lists the article titles visible in a screenshot.
pub trait TitleDetector {
    async fn detect_titles(&self, screenshot: &Path) -> Detection<Vec<String>>;
}

/// Finds all visible text with region boxes, in model order.
pub trait TextLocalizer {
    async fn localize_text(&self, screenshot: &Path) -> Detection<Vec<TextSpan>>;
}

/// Turns one screenshot into the points to click, in detected-title order.
#[derive(Debug)]
pub struct ScreenshotAnalyzer<D, L> {
    detector: D,
    localizer: L,
}

impl<D, L> ScreenshotAnalyzer<D, L>
where
    D: TitleDetector,
    L: TextLocalizer,
{
    pub fn new(detector: D, localizer: L) -> Self {
        Self {
            detector,
            localizer,
        }
    }

    #[instrument(level = "info", skip_all, fields(screenshot = %screenshot.display()))]
    pub async fn analyze(&self, screenshot: &Path) -> Vec<ClickPoint> {
        let Some(titles) = self.detector.detect_titles(screenshot).await.into_option() else {
            return Vec::new();
        };
        debug!(
            count = titles.len(),
            titles = %titles.iter().join(" | "),
            "Titles from image"
        );

        let Some(spans) = self.localizer.localize_text(screenshot).await.into_option() else {
            return Vec::new();
        };
        let spans = filter_title_spans(spans);
        if spans.is_empty() {
            return Vec::new();
        }

        let points = match_titles(&titles, &spans);
        debug!(?points, "Points to click");
        points
    }
}
