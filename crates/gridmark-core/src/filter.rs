//! Denoise filtering applied before binarization.

use crate::image::ImageView;

/// Radius of the 5x5 median window.
const MEDIAN_RADIUS: isize = 2;

/// 5x5 median blur.
///
/// Knocks out salt-and-pepper noise while keeping the marker's edges
/// sharp, which matters for the polygon approximation downstream. Border
/// pixels clamp the window to the image.
///
/// `dst` must hold `img.width * img.height` bytes.
pub fn median_blur(img: &ImageView, dst: &mut [u8]) {
    debug_assert_eq!(dst.len(), img.width * img.height);

    let width = img.width as isize;
    let height = img.height as isize;
    let mut window = [0u8; 25];

    for y in 0..height {
        for x in 0..width {
            let mut n = 0;
            for dy in -MEDIAN_RADIUS..=MEDIAN_RADIUS {
                let sy = (y + dy).clamp(0, height - 1) as usize;
                for dx in -MEDIAN_RADIUS..=MEDIAN_RADIUS {
                    let sx = (x + dx).clamp(0, width - 1) as usize;
                    window[n] = img.pixel(sx, sy);
                    n += 1;
                }
            }
            window.sort_unstable();
            dst[(y * width + x) as usize] = window[12];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_is_unchanged() {
        let data = vec![77u8; 8 * 8];
        let img = ImageView::new(&data, 8, 8, 8).unwrap();
        let mut out = vec![0u8; 8 * 8];
        median_blur(&img, &mut out);
        assert!(out.iter().all(|&p| p == 77));
    }

    #[test]
    fn removes_isolated_speck() {
        let mut data = vec![0u8; 9 * 9];
        data[4 * 9 + 4] = 255;
        let img = ImageView::new(&data, 9, 9, 9).unwrap();
        let mut out = vec![0u8; 9 * 9];
        median_blur(&img, &mut out);
        assert_eq!(out[4 * 9 + 4], 0);
    }

    #[test]
    fn preserves_straight_edge() {
        // Vertical black/white step; the median of a 5x5 window centered
        // on either side of the step keeps its own side's value.
        let width = 10;
        let mut data = vec![0u8; width * 10];
        for row in data.chunks_mut(width) {
            for (x, p) in row.iter_mut().enumerate() {
                *p = if x < 5 { 0 } else { 255 };
            }
        }
        let img = ImageView::new(&data, width, 10, width).unwrap();
        let mut out = vec![0u8; width * 10];
        median_blur(&img, &mut out);
        assert_eq!(out[5 * width + 3], 0);
        assert_eq!(out[5 * width + 6], 255);
    }
}
