//! Region OCR: every visible piece of text with a four-corner box.
//!
//! The OCR model sits behind an HTTP endpoint. It receives the screenshot
//! and the `<OCR_WITH_REGION>` task token and answers with a result keyed by
//! that same token:
//!
//! ```text
//! {"<OCR_WITH_REGION>": {"labels": ["..."], "quad_boxes": [[x1, y1, ..., x4, y4]]}}
//! ```

use super::overlay::draw_ocr_overlay;
use super::{Detection, PerceptionError, TextLocalizer};
use crate::context::RunContext;
use crate::models::{Quad, TextSpan};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Task token understood by the OCR model.
pub const OCR_WITH_REGION: &str = "<OCR_WITH_REGION>";

const END_OF_SEQUENCE: &str = "</s>";

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    task: &'a str,
    image: String,
}

#[derive(Debug, Deserialize)]
pub struct RegionResult {
    pub labels: Vec<String>,
    pub quad_boxes: Vec<Vec<f64>>,
}

impl RegionResult {
    /// Pair labels with their boxes, keeping model order.
    pub fn into_spans(self) -> Result<Vec<TextSpan>, PerceptionError> {
        if self.labels.len() != self.quad_boxes.len() {
            return Err(PerceptionError::LengthMismatch {
                labels: self.labels.len(),
                boxes: self.quad_boxes.len(),
            });
        }

        self.labels
            .into_iter()
            .zip(self.quad_boxes)
            .enumerate()
            .map(|(index, (label, coords))| -> Result<TextSpan, PerceptionError> {
                let quad: Quad = coords
                    .as_slice()
                    .try_into()
                    .map_err(|_| PerceptionError::MalformedQuad {
                        index,
                        len: coords.len(),
                    })?;
                Ok(TextSpan::new(clean_label(&label), quad))
            })
            .collect()
    }
}

fn clean_label(label: &str) -> String {
    let label = label.trim();
    label
        .strip_prefix(END_OF_SEQUENCE)
        .unwrap_or(label)
        .trim()
        .to_string()
}

/// HTTP-backed [`TextLocalizer`].
#[derive(Debug, Clone)]
pub struct RegionOcr<'a> {
    client: reqwest::Client,
    endpoint: String,
    ctx: &'a RunContext,
}

impl<'a> RegionOcr<'a> {
    pub fn new(endpoint: impl Into<String>, ctx: &'a RunContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            ctx,
        }
    }

    pub async fn ocr_and_bounding_boxes(
        &self,
        screenshot: &Path,
    ) -> Result<Vec<TextSpan>, PerceptionError> {
        let bytes = tokio::fs::read(screenshot)
            .await
            .map_err(|source| PerceptionError::Image {
                path: screenshot.display().to_string(),
                source,
            })?;

        let t0 = Instant::now();
        let mut parsed: HashMap<String, RegionResult> = self
            .client
            .post(&self.endpoint)
            .json(&OcrRequest {
                task: OCR_WITH_REGION,
                image: STANDARD.encode(bytes),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let spans = parsed
            .remove(OCR_WITH_REGION)
            .ok_or_else(|| PerceptionError::MissingTask(OCR_WITH_REGION.to_string()))?
            .into_spans()?;
        debug!(
            spans = spans.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "OCR finished"
        );

        if self.ctx.debug {
            if let Err(e) = draw_ocr_overlay(screenshot, &spans, &self.ctx.cache) {
                warn!(error = %e, "Failed to save OCR debug overlay");
            }
        }

        Ok(spans)
    }
}

impl TextLocalizer for RegionOcr<'_> {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn localize_text(&self, screenshot: &Path) -> Detection<Vec<TextSpan>> {
        match self.ocr_and_bounding_boxes(screenshot).await {
            Ok(spans) if spans.is_empty() => Detection::Empty,
            Ok(spans) => Detection::Detected(spans),
            Err(e) => {
                error!(screenshot = %screenshot.display(), error = %e, "Text localization failed");
                Detection::Empty
            }
        }
    }
}
