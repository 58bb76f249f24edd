//! Utilities for tests and synthetic data generation.

mod scene;

pub use scene::{MarkerPlacement, SceneBuilder};

use crate::catalog::{Code, GRID_DIM};
use crate::image::GrayImage;

/// Render the canonical bitmap a perfectly printed marker would rectify
/// to: a black one-cell frame around the 3x3 code grid, white cells for
/// set bits.
#[must_use]
pub fn render_canonical_bitmap(code: Code, cell_size: usize) -> GrayImage {
    let cells = GRID_DIM + 2;
    let side = cell_size * cells;
    let mut bitmap = GrayImage::zeroed(side, side);

    for cy in 0..cells {
        for cx in 0..cells {
            let border = cx == 0 || cy == 0 || cx == cells - 1 || cy == cells - 1;
            let value = if border {
                0
            } else if code.bit(cy - 1, cx - 1) {
                255
            } else {
                0
            };
            if value != 0 {
                for y in cy * cell_size..(cy + 1) * cell_size {
                    for x in cx * cell_size..(cx + 1) * cell_size {
                        bitmap.set_pixel(x, y, value);
                    }
                }
            }
        }
    }
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BUILTIN_CATALOG;

    #[test]
    fn rendered_bitmap_has_black_frame() {
        let code = BUILTIN_CATALOG.code(1).unwrap();
        let bitmap = render_canonical_bitmap(code, 10);
        assert_eq!(bitmap.width, 50);
        // Frame corners and edge midpoints are black.
        assert_eq!(bitmap.pixel(0, 0), 0);
        assert_eq!(bitmap.pixel(25, 5), 0);
        assert_eq!(bitmap.pixel(5, 25), 0);
        // Pattern 1 has its top-left code cell set.
        assert_eq!(bitmap.pixel(15, 15), 255);
        // And its center cell clear.
        assert_eq!(bitmap.pixel(25, 25), 0);
    }
}
