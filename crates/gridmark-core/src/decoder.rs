//! Candidate rectification and code extraction.
//!
//! A surviving quadrilateral is warped into the canonical square bitmap
//! (5 cells on a side at the configured cell size), binarized with Otsu,
//! checked for the printed black border, and finally sampled into the
//! 3x3 code grid.

use nalgebra::{SMatrix, SVector};

use crate::catalog::{Code, GRID_DIM};
use crate::contour::Point;
use crate::image::{GrayImage, ImageView};
use crate::quad::Winding;

/// A 3x3 projective transform.
pub struct Homography {
    h: SMatrix<f64, 3, 3>,
}

impl Homography {
    /// Compute the homography mapping each `src[i]` onto `dst[i]` using
    /// DLT. With four correspondences the system is exactly determined;
    /// `h22` is fixed to 1 and the remaining eight unknowns solved by LU.
    /// Returns `None` for degenerate configurations.
    #[must_use]
    pub fn from_pairs(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Self> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for i in 0..4 {
            let [sx, sy] = src[i];
            let [dx, dy] = dst[i];

            a[(i * 2, 0)] = sx;
            a[(i * 2, 1)] = sy;
            a[(i * 2, 2)] = 1.0;
            a[(i * 2, 6)] = -sx * dx;
            a[(i * 2, 7)] = -sy * dx;
            b[i * 2] = dx;

            a[(i * 2 + 1, 3)] = sx;
            a[(i * 2 + 1, 4)] = sy;
            a[(i * 2 + 1, 5)] = 1.0;
            a[(i * 2 + 1, 6)] = -sx * dy;
            a[(i * 2 + 1, 7)] = -sy * dy;
            b[i * 2 + 1] = dy;
        }

        let h_vec = a.lu().solve(&b)?;
        let mut h = SMatrix::<f64, 3, 3>::identity();
        h[(0, 0)] = h_vec[0];
        h[(0, 1)] = h_vec[1];
        h[(0, 2)] = h_vec[2];
        h[(1, 0)] = h_vec[3];
        h[(1, 1)] = h_vec[4];
        h[(1, 2)] = h_vec[5];
        h[(2, 0)] = h_vec[6];
        h[(2, 1)] = h_vec[7];
        h[(2, 2)] = 1.0;
        Some(Self { h })
    }

    /// Project a point through the homography.
    #[must_use]
    pub fn project(&self, p: [f64; 2]) -> [f64; 2] {
        let v = self.h * SVector::<f64, 3>::new(p[0], p[1], 1.0);
        [v[0] / v[2], v[1] / v[2]]
    }
}

/// Canonical-square corner ordering for each source winding.
///
/// Two mappings exist because the extractor does not guarantee a
/// consistent vertex order; pairing a counter-clockwise polygon with the
/// clockwise destination would mirror the bitmap and corrupt decoding.
fn canonical_corners(size: f64, winding: Winding) -> [[f64; 2]; 4] {
    match winding {
        Winding::Clockwise => [[0.0, 0.0], [size, 0.0], [size, size], [0.0, size]],
        Winding::CounterClockwise => [[0.0, 0.0], [0.0, size], [size, size], [size, 0.0]],
    }
}

/// Warp a candidate region into the canonical square bitmap.
///
/// The transform is solved canonical-to-image so every output pixel is a
/// single bilinear sample of the source. Returns `None` when the source
/// quadrilateral is projectively degenerate (the convexity precondition
/// upstream should prevent that).
#[must_use]
pub fn rectify(
    img: &ImageView,
    polygon: &[Point; 4],
    winding: Winding,
    cell_size: usize,
) -> Option<GrayImage> {
    let side = cell_size * (GRID_DIM + 2);
    let dst = canonical_corners(side as f64, winding);
    let src = [
        [f64::from(polygon[0].x), f64::from(polygon[0].y)],
        [f64::from(polygon[1].x), f64::from(polygon[1].y)],
        [f64::from(polygon[2].x), f64::from(polygon[2].y)],
        [f64::from(polygon[3].x), f64::from(polygon[3].y)],
    ];
    let h = Homography::from_pairs(&dst, &src)?;

    let mut bitmap = GrayImage::zeroed(side, side);
    for y in 0..side {
        for x in 0..side {
            let [sx, sy] = h.project([x as f64, y as f64]);
            let value = img.sample_bilinear(sx, sy).round().clamp(0.0, 255.0) as u8;
            bitmap.set_pixel(x, y, value);
        }
    }
    Some(bitmap)
}

/// Border validation: the combined mean of the four one-cell edge strips
/// must stay at or below `max_mean` for the printed black frame.
///
/// Top and bottom strips span the full width; left and right cover the
/// rows between them, so no pixel is counted twice.
#[must_use]
pub fn has_dark_border(bitmap: &GrayImage, cell_size: usize, max_mean: f64) -> bool {
    let side = bitmap.width;
    let top = bitmap.region_mean(0, 0, side, cell_size);
    let bottom = bitmap.region_mean(0, side - cell_size, side, side);
    let left = bitmap.region_mean(0, cell_size, cell_size, side - cell_size);
    let right = bitmap.region_mean(side - cell_size, cell_size, side, side - cell_size);
    let mean = (top + bottom + left + right) / 4.0;
    mean <= max_mean
}

/// Sample the interior 3x3 grid into a code.
///
/// Each cell reads as the block average of its full cell area; averages
/// above `bit_mean_min` become 1 bits. Block averaging rides out noise
/// and resampling artifacts that single-pixel probes are vulnerable to.
#[must_use]
pub fn read_code(bitmap: &GrayImage, cell_size: usize, bit_mean_min: f64) -> Code {
    let mut cells = [[0u8; GRID_DIM]; GRID_DIM];
    for (row, cols) in cells.iter_mut().enumerate() {
        let y0 = cell_size * (row + 1);
        for (col, cell) in cols.iter_mut().enumerate() {
            let x0 = cell_size * (col + 1);
            let mean = bitmap.region_mean(x0, y0, x0 + cell_size, y0 + cell_size);
            if mean > bit_mean_min {
                *cell = 1;
            }
        }
    }
    Code::from_cells(cells)
}
