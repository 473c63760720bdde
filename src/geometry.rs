//! Quadrilateral bounding-box math.

use crate::models::{ClickPoint, Quad};
use itertools::Itertools;

/// Centroid of a four-corner box, rounded to the nearest pixel.
///
/// Ties round to even, so `2.5` becomes `2` and `3.5` becomes `4`.
///
/// # Examples
///
/// ```ignore
/// let c = quad_centroid(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]);
/// assert_eq!(c, ClickPoint::new(5, 5));
/// ```
pub fn quad_centroid(quad: &Quad) -> ClickPoint {
    let (sum_x, sum_y) = quad
        .iter()
        .tuples()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));

    ClickPoint::new(
        (sum_x / 4.0).round_ties_even() as i64,
        (sum_y / 4.0).round_ties_even() as i64,
    )
}

/// Largest y-coordinate among the four corners (the lowest point on screen).
pub fn quad_max_y(quad: &Quad) -> f64 {
    quad.iter()
        .skip(1)
        .step_by(2)
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}
