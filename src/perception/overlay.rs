//! Debug overlay of OCR results.
//!
//! Each span's quad is outlined on a copy of the screenshot and its label is
//! written just inside the first corner, both in the span's palette color.

use crate::context::{RunCache, section_image_index};
use crate::models::TextSpan;
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::debug;

static LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const LABEL_SCALE: f32 = 12.0;
const LABEL_OFFSET: (f32, f32) = (8.0, 2.0);

/// Outline thickness in pixels.
const OUTLINE_WIDTH: i32 = 3;

const PALETTE: [Rgb<u8>; 19] = [
    Rgb([0, 0, 255]),     // blue
    Rgb([255, 165, 0]),   // orange
    Rgb([0, 128, 0]),     // green
    Rgb([128, 0, 128]),   // purple
    Rgb([165, 42, 42]),   // brown
    Rgb([255, 192, 203]), // pink
    Rgb([128, 128, 128]), // gray
    Rgb([128, 128, 0]),   // olive
    Rgb([0, 255, 255]),   // cyan
    Rgb([255, 0, 0]),     // red
    Rgb([0, 255, 0]),     // lime
    Rgb([75, 0, 130]),    // indigo
    Rgb([238, 130, 238]), // violet
    Rgb([127, 255, 212]), // aqua
    Rgb([255, 0, 255]),   // magenta
    Rgb([255, 127, 80]),  // coral
    Rgb([255, 215, 0]),   // gold
    Rgb([210, 180, 140]), // tan
    Rgb([135, 206, 235]), // skyblue
];

/// Save an annotated copy of `screenshot` into the run directory.
///
/// Returns the path of the annotated image.
pub fn draw_ocr_overlay(
    screenshot: &Path,
    spans: &[TextSpan],
    cache: &RunCache,
) -> Result<PathBuf, Box<dyn Error>> {
    let font = FontRef::try_from_slice(LABEL_FONT)?;
    let mut canvas = image::open(screenshot)?.to_rgb8();

    for (i, span) in spans.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let corners = clamped_corners(&canvas, &span.quad);
        draw_outline(&mut canvas, &corners, color);

        let (x1, y1) = corners[0];
        draw_text_mut(
            &mut canvas,
            color,
            (x1 + LABEL_OFFSET.0) as i32,
            (y1 + LABEL_OFFSET.1) as i32,
            PxScale::from(LABEL_SCALE),
            &font,
            &span.text,
        );
    }

    let stem = screenshot
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    let image_path = cache.file(&format!("DEBUG_google_news_{stem}.png"));
    canvas.save(&image_path)?;

    let scroll = screenshot
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(section_image_index);
    debug!(path = %image_path.display(), ?scroll, spans = spans.len(), "Saved OCR overlay");
    Ok(image_path)
}

/// Quad corners pulled into the canvas, give or take the outline width.
///
/// Keeps rasterization bounded when the model reports absurd coordinates.
fn clamped_corners(canvas: &RgbImage, quad: &[f64; 8]) -> [(f32, f32); 4] {
    let margin = OUTLINE_WIDTH as f32;
    let max_x = canvas.width() as f32 + margin;
    let max_y = canvas.height() as f32 + margin;
    let mut corners = [(0.0, 0.0); 4];
    for (corner, xy) in corners.iter_mut().zip(quad.chunks_exact(2)) {
        let x = if xy[0].is_finite() { xy[0] as f32 } else { 0.0 };
        let y = if xy[1].is_finite() { xy[1] as f32 } else { 0.0 };
        *corner = (x.clamp(-margin, max_x), y.clamp(-margin, max_y));
    }
    corners
}

fn draw_outline(canvas: &mut RgbImage, corners: &[(f32, f32); 4], color: Rgb<u8>) {
    let half = OUTLINE_WIDTH / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            let (dx, dy) = (dx as f32, dy as f32);
            for (i, &(x0, y0)) in corners.iter().enumerate() {
                let (x1, y1) = corners[(i + 1) % corners.len()];
                draw_line_segment_mut(canvas, (x0 + dx, y0 + dy), (x1 + dx, y1 + dy), color);
            }
        }
    }
}
