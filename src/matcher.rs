//! Reconciles vision-detected titles with OCR spans to find click targets.

use crate::geometry::quad_centroid;
use crate::models::{ClickPoint, TextSpan};
use tracing::debug;

/// Compute one click point per detected title that has a spatial match.
///
/// For each title (case-folded) the first span, in span order, whose
/// case-folded text is a substring of the title wins. Titles without a
/// matching span are skipped. Several titles may resolve to the same span.
pub fn match_titles(titles: &[String], spans: &[TextSpan]) -> Vec<ClickPoint> {
    let folded: Vec<String> = spans.iter().map(|s| s.text.to_lowercase()).collect();

    titles
        .iter()
        .filter_map(|title| {
            let title = title.to_lowercase();
            let hit = folded.iter().position(|text| title.contains(text.as_str()));
            match hit {
                Some(i) => Some(quad_centroid(&spans[i].quad)),
                None => {
                    debug!(%title, "No OCR span matched title");
                    None
                }
            }
        })
        .collect()
}
