//! Heuristic filter separating article-title candidates from page chrome.

use crate::geometry::quad_max_y;
use crate::models::TextSpan;
use tracing::debug;

/// Height of the fixed navigation bar at the top of the viewport.
///
/// Spans whose lowest corner sits at or above this line are chrome.
pub const CHROME_HEIGHT_PX: f64 = 110.0;

/// Spans with this many words or fewer are never titles.
pub const MIN_TITLE_WORDS: usize = 2;

/// Keep only spans that could plausibly be article titles.
///
/// A span is dropped if its text has [`MIN_TITLE_WORDS`] or fewer
/// whitespace-separated words, or if its quad lies entirely inside the
/// top [`CHROME_HEIGHT_PX`] pixels. Input order is preserved.
pub fn filter_title_spans(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let total = spans.len();
    let remaining: Vec<TextSpan> = spans.into_iter().filter(is_title_candidate).collect();
    debug!(
        remaining = remaining.len(),
        total, "Filtered OCR spans"
    );
    remaining
}

fn is_title_candidate(span: &TextSpan) -> bool {
    let words = span.text.split_whitespace().count();
    words > MIN_TITLE_WORDS && quad_max_y(&span.quad) > CHROME_HEIGHT_PX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_at(max_y: f64) -> [f64; 8] {
        [10.0, max_y - 20.0, 300.0, max_y - 20.0, 300.0, max_y, 10.0, max_y]
    }

    #[test]
    fn test_single_word_dropped_everywhere() {
        let spans = vec![
            TextSpan::new("AI", quad_at(50.0)),
            TextSpan::new("AI", quad_at(500.0)),
        ];
        assert!(filter_title_spans(spans).is_empty());
    }

    #[test]
    fn test_two_words_dropped() {
        let spans = vec![TextSpan::new("  Top   stories ", quad_at(400.0))];
        assert!(filter_title_spans(spans).is_empty());
    }

    #[test]
    fn test_chrome_region_dropped() {
        let spans = vec![TextSpan::new("Researchers unveil new model", quad_at(50.0))];
        assert!(filter_title_spans(spans).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let spans = vec![TextSpan::new("Researchers unveil new model", quad_at(110.0))];
        assert!(filter_title_spans(spans).is_empty());
    }

    #[test]
    fn test_title_below_chrome_kept() {
        let spans = vec![
            TextSpan::new("Researchers unveil new model", quad_at(200.0)),
            TextSpan::new("Sign in", quad_at(200.0)),
            TextSpan::new("Chips shortage eases again", quad_at(640.0)),
        ];
        let kept = filter_title_spans(spans);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text, "Researchers unveil new model");
        assert_eq!(kept[1].text, "Chips shortage eases again");
    }
}
