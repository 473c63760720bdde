//! Data models shared by every stage of the discovery pipeline.
//!
//! - [`Article`]: a cleaned article, the only value that outlives a scroll
//! - [`TextSpan`]: one OCR-detected text region with its quadrilateral box
//! - [`ClickPoint`]: a viewport pixel to click on
//! - [`RawPage`]: HTML captured from a freshly opened article tab
//! - [`NewsReport`]: per-section article lists returned by a run

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A cleaned news article.
///
/// Produced only by the content cleaner. Within a single section no two
/// articles share a `url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Final URL of the article page (after redirects).
    pub url: String,
    /// The page `<title>`, or an empty string if the page had none.
    pub title: String,
    /// Article body reformatted as Markdown by the text-generation model.
    pub text: String,
}

/// A four-corner bounding box: `[x1, y1, x2, y2, x3, y3, x4, y4]`.
///
/// Corners are in screenshot pixel space and are not guaranteed to be
/// axis-aligned.
pub type Quad = [f64; 8];

/// A piece of text found by region OCR on a screenshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub quad: Quad,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, quad: Quad) -> Self {
        Self {
            text: text.into(),
            quad,
        }
    }
}

/// A pixel coordinate inside the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickPoint {
    pub x: i64,
    pub y: i64,
}

impl ClickPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// HTML captured right after an article tab opened.
///
/// Consumed exactly once by the content cleaner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// Section name mapped to the section's articles, in scroll order.
///
/// Sections keep the order they were visited in.
pub type NewsReport = IndexMap<String, Vec<Article>>;
