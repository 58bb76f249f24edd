//! Candidate quadrilateral extraction.
//!
//! Raw contours pass through a short chain of accept/reject filters; any
//! failure discards the candidate immediately. Survivors keep both their
//! approximated 4-vertex polygon (in trace order, never reordered) and
//! the originating contour.

use bumpalo::Bump;

use crate::config::DetectorConfig;
use crate::contour::{approx_poly_dp, arc_length, contour_area, is_convex_quad, Point};

/// Polygon winding in image coordinates (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    /// Positive signed cross of the first three vertices.
    Clockwise,
    /// Non-positive signed cross.
    CounterClockwise,
}

/// Determine winding from the first three vertices:
/// `cross = (x1-x0)(y2-y0) - (x2-x0)(y1-y0)`, positive means clockwise.
#[must_use]
pub fn winding(polygon: &[Point; 4]) -> Winding {
    let [p0, p1, p2, _] = *polygon;
    let cross = i64::from(p1.x - p0.x) * i64::from(p2.y - p0.y)
        - i64::from(p2.x - p0.x) * i64::from(p1.y - p0.y);
    if cross > 0 {
        Winding::Clockwise
    } else {
        Winding::CounterClockwise
    }
}

/// Noise filter: enclosed area at or below the configured minimum.
fn small_area(points: &[Point], config: &DetectorConfig) -> bool {
    contour_area(points) <= config.min_contour_area
}

/// Run the shape filter chain on one raw contour.
///
/// Returns the approximated polygon if the contour survives: area filter,
/// polygon approximation at 5% of arc length, exactly-four-vertices
/// filter, and the convex/non-degenerate precondition the rectifier
/// requires. The polygon keeps the approximation's vertex order.
#[must_use]
pub fn filter_quad(arena: &Bump, points: &[Point], config: &DetectorConfig) -> Option<[Point; 4]> {
    if small_area(points, config) {
        return None;
    }

    let epsilon = config.poly_epsilon_ratio * arc_length(points);
    let poly = approx_poly_dp(arena, points, epsilon);

    if poly.len() != 4 {
        return None;
    }
    let polygon = [poly[0], poly[1], poly[2], poly[3]];

    if !is_convex_quad(&polygon) {
        return None;
    }
    Some(polygon)
}
