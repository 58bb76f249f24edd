//! Image binarization.
//!
//! Two thresholds are used in the pipeline: a fixed global threshold that
//! separates marker ink from background before contour extraction, and an
//! Otsu threshold that re-binarizes each rectified candidate patch under
//! its own lighting.

use crate::image::{GrayImage, ImageView};

/// Fixed binary threshold: pixels strictly above `thresh` become 255,
/// everything else 0.
///
/// `dst` must hold `img.width * img.height` bytes.
pub fn threshold_binary(img: &ImageView, thresh: u8, dst: &mut [u8]) {
    debug_assert_eq!(dst.len(), img.width * img.height);
    for y in 0..img.height {
        let row = img.row(y);
        let out = &mut dst[y * img.width..(y + 1) * img.width];
        for (d, &s) in out.iter_mut().zip(row) {
            *d = if s > thresh { 255 } else { 0 };
        }
    }
}

/// Otsu's threshold: maximizes between-class variance over the intensity
/// histogram. Returns the threshold value; pixels above it belong to the
/// bright class.
#[must_use]
pub fn otsu_threshold(pixels: &[u8]) -> u8 {
    let mut hist = [0u32; 256];
    for &p in pixels {
        hist[p as usize] += 1;
    }

    let total = pixels.len() as f64;
    let mut sum = 0.0;
    for (i, &count) in hist.iter().enumerate() {
        sum += i as f64 * f64::from(count);
    }

    let mut sum_b = 0.0;
    let mut w_b = 0.0;
    let mut best = 0.0;
    let mut threshold = 0u8;

    for (i, &count) in hist.iter().enumerate() {
        w_b += f64::from(count);
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }
        sum_b += i as f64 * f64::from(count);

        let mean_b = sum_b / w_b;
        let mean_f = (sum - sum_b) / w_f;
        let between = w_b * w_f * (mean_b - mean_f) * (mean_b - mean_f);
        if between > best {
            best = between;
            threshold = i as u8;
        }
    }

    threshold
}

/// In-place Otsu binarization of an owned raster (the canonical bitmap).
pub fn binarize_otsu(bitmap: &mut GrayImage) {
    let thresh = otsu_threshold(&bitmap.data);
    for p in &mut bitmap.data {
        *p = if *p > thresh { 255 } else { 0 };
    }
}
