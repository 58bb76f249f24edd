//! Contour extraction and polygon geometry.
//!
//! Border following runs on the binarized frame and yields both outer
//! borders of bright components and the borders of holes inside them.
//! Dark markers on a light background arrive as hole borders of the
//! background component, so both kinds feed the candidate filter chain.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use crate::image::ImageView;

/// An integer pixel coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Construct a point.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A traced boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    /// Boundary pixels in trace order.
    pub points: Vec<Point>,
    /// True if this border encloses a hole inside a bright component.
    pub hole: bool,
}

/// 8-neighborhood offsets, counter-clockwise starting east.
const NEIGHBORS: [(i32, i32); 8] =
    [(1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1), (1, 1)];

/// Trace every border in a binary image (Suzuki border following).
///
/// Nonzero pixels are foreground. Outer borders and hole borders are both
/// returned; the caller's filters decide which become candidates.
#[must_use]
pub fn find_contours(bin: &ImageView) -> Vec<Contour> {
    let width = bin.width;
    let height = bin.height;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    // Label raster with a one-pixel zero frame so neighbor probes never
    // leave the buffer.
    let padded_w = width + 2;
    let mut labels = vec![0i32; padded_w * (height + 2)];
    for y in 0..height {
        let row = bin.row(y);
        let out = &mut labels[(y + 1) * padded_w + 1..(y + 1) * padded_w + 1 + width];
        for (l, &p) in out.iter_mut().zip(row) {
            *l = i32::from(p != 0);
        }
    }

    // Flat neighbor offsets, doubled so a forward probe can run past
    // index 7 without wrapping.
    let mut deltas = [0isize; 16];
    for (i, &(dx, dy)) in NEIGHBORS.iter().enumerate() {
        let d = dx as isize + dy as isize * padded_w as isize;
        deltas[i] = d;
        deltas[i + 8] = d;
    }

    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 0..height {
        let mut pos = (y + 1) * padded_w + 1;
        for x in 0..width {
            let pix = labels[pos];
            if pix != 0 {
                let start = Point::new(x as i32, y as i32);
                if pix == 1 && labels[pos - 1] == 0 {
                    nbd += 1;
                    contours.push(trace_border(&mut labels, pos, nbd, start, false, &deltas));
                } else if pix >= 1 && labels[pos + 1] == 0 {
                    nbd += 1;
                    contours.push(trace_border(&mut labels, pos, nbd, start, true, &deltas));
                }
            }
            pos += 1;
        }
    }

    contours
}

/// Follow one border starting at `pos`, relabeling visited pixels with
/// `nbd` so the raster scan does not restart the same border.
fn trace_border(
    labels: &mut [i32],
    pos: usize,
    nbd: i32,
    mut point: Point,
    hole: bool,
    deltas: &[isize; 16],
) -> Contour {
    let mut points = Vec::new();

    // Probe backwards from the initial direction for a nonzero neighbor.
    let mut dir = if hole { 0usize } else { 4usize };
    let dir_start = dir;
    let first;
    loop {
        dir = dir.wrapping_sub(1) & 7;
        let probe = (pos as isize + deltas[dir]) as usize;
        if labels[probe] != 0 {
            first = probe;
            break;
        }
        if dir == dir_start {
            // Isolated pixel.
            labels[pos] = -nbd;
            points.push(point);
            return Contour { points, hole };
        }
    }

    let mut current = pos;
    let mut next;
    loop {
        let dir_end = dir;

        // Sweep forward until the next nonzero neighbor.
        loop {
            dir = (dir + 1) & 15;
            next = (current as isize + deltas[dir]) as usize;
            if labels[next] != 0 {
                break;
            }
        }
        dir &= 7;

        // A sweep that crossed the east direction saw the background to
        // the right of this pixel: mark it so hole scans skip it.
        if dir.wrapping_sub(1) < dir_end {
            labels[current] = -nbd;
        } else if labels[current] == 1 {
            labels[current] = nbd;
        }

        points.push(point);
        point.x += NEIGHBORS[dir].0;
        point.y += NEIGHBORS[dir].1;

        if next == pos && current == first {
            break;
        }
        current = next;
        dir = (dir + 4) & 7;
    }

    Contour { points, hole }
}

/// Enclosed area of a closed contour (absolute shoelace sum).
#[must_use]
pub fn contour_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    let n = points.len();
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    (twice_area.abs() as f64) * 0.5
}

/// Perimeter of a closed contour.
#[must_use]
pub fn arc_length(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mut len = 0.0;
    let mut prev = points[n - 1];
    for &p in points {
        let dx = f64::from(p.x - prev.x);
        let dy = f64::from(p.y - prev.y);
        len += (dx * dx + dy * dy).sqrt();
        prev = p;
    }
    len
}

/// Spatial moments of a closed polygon (Green's theorem).
#[derive(Clone, Copy, Debug, Default)]
pub struct Moments {
    /// Signed area integral.
    pub m00: f64,
    /// First moment about x.
    pub m10: f64,
    /// First moment about y.
    pub m01: f64,
}

impl Moments {
    /// Area-weighted centroid, truncated to integer pixel coordinates.
    /// `None` when the polygon has (near-)zero area.
    #[must_use]
    pub fn centroid(&self) -> Option<(i32, i32)> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some(((self.m10 / self.m00) as i32, (self.m01 / self.m00) as i32))
    }
}

/// Compute polygon moments of a closed contour.
#[must_use]
pub fn moments(points: &[Point]) -> Moments {
    let n = points.len();
    if n < 3 {
        return Moments::default();
    }
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross =
            f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
        m00 += cross;
        m10 += (f64::from(p.x) + f64::from(q.x)) * cross;
        m01 += (f64::from(p.y) + f64::from(q.y)) * cross;
    }
    Moments { m00: m00 / 2.0, m10: m10 / 6.0, m01: m01 / 6.0 }
}

/// Approximate a closed contour with a polygon (Douglas-Peucker).
///
/// The contour is anchored at two mutually distant extremes and each of
/// the two chains between them is simplified independently with the given
/// absolute tolerance, which handles the closed curve without biasing the
/// result toward the trace's start point.
pub fn approx_poly_dp<'a>(arena: &'a Bump, points: &[Point], epsilon: f64) -> BumpVec<'a, Point> {
    let n = points.len();
    if n <= 3 {
        return BumpVec::from_iter_in(points.iter().copied(), arena);
    }

    let a = farthest_from(points, 0);
    let b = farthest_from(points, a);

    let chain_ab = collect_chain(arena, points, a, b);
    let chain_ba = collect_chain(arena, points, b, a);

    let simplified_ab = simplify_open_chain(arena, &chain_ab, epsilon);
    let simplified_ba = simplify_open_chain(arena, &chain_ba, epsilon);

    let mut poly = BumpVec::new_in(arena);
    poly.extend_from_slice(&simplified_ab[..simplified_ab.len() - 1]);
    poly.extend_from_slice(&simplified_ba[..simplified_ba.len() - 1]);
    poly
}

fn farthest_from(points: &[Point], from: usize) -> usize {
    let origin = points[from];
    let mut best = from;
    let mut best_d = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = i64::from(p.x - origin.x);
        let dy = i64::from(p.y - origin.y);
        let d = dx * dx + dy * dy;
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Copy the circular slice `from..=to` (wrapping) into an arena buffer.
fn collect_chain<'a>(
    arena: &'a Bump,
    points: &[Point],
    from: usize,
    to: usize,
) -> BumpVec<'a, Point> {
    let n = points.len();
    let mut chain = BumpVec::new_in(arena);
    let mut i = from;
    loop {
        chain.push(points[i]);
        if i == to {
            break;
        }
        i = (i + 1) % n;
    }
    chain
}

/// Iterative Douglas-Peucker on an open chain; endpoints are always kept.
fn simplify_open_chain<'a>(
    arena: &'a Bump,
    chain: &[Point],
    epsilon: f64,
) -> BumpVec<'a, Point> {
    let n = chain.len();
    if n < 3 {
        return BumpVec::from_iter_in(chain.iter().copied(), arena);
    }

    let mut keep = BumpVec::from_iter_in((0..n).map(|_| false), arena);
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = BumpVec::new_in(arena);
    stack.push((0usize, n - 1));

    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }
        let mut dmax = 0.0;
        let mut index = start;
        for i in start + 1..end {
            let d = perpendicular_distance(chain[i], chain[start], chain[end]);
            if d > dmax {
                dmax = d;
                index = i;
            }
        }
        if dmax > epsilon {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    let mut simplified = BumpVec::new_in(arena);
    for (i, &k) in keep.iter().enumerate() {
        if k {
            simplified.push(chain[i]);
        }
    }
    simplified
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let mag = (dx * dx + dy * dy).sqrt();
    if mag < 1e-9 {
        let ex = f64::from(p.x - a.x);
        let ey = f64::from(p.y - a.y);
        return (ex * ex + ey * ey).sqrt();
    }
    (dy * f64::from(p.x) - dx * f64::from(p.y) + f64::from(b.x) * f64::from(a.y)
        - f64::from(b.y) * f64::from(a.x))
        .abs()
        / mag
}

/// True if the four vertices form a strictly convex, non-degenerate
/// quadrilateral: every consecutive edge pair turns the same way and no
/// cross product vanishes (which also rejects repeated and collinear
/// vertices).
#[must_use]
pub fn is_convex_quad(poly: &[Point; 4]) -> bool {
    let mut positive = 0;
    let mut negative = 0;
    for i in 0..4 {
        let p = poly[i];
        let q = poly[(i + 1) % 4];
        let r = poly[(i + 2) % 4];
        let cross = i64::from(q.x - p.x) * i64::from(r.y - q.y)
            - i64::from(q.y - p.y) * i64::from(r.x - q.x);
        if cross > 0 {
            positive += 1;
        } else if cross < 0 {
            negative += 1;
        } else {
            return false;
        }
    }
    positive == 4 || negative == 4
}
