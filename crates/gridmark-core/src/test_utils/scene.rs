//! Synthetic frame rendering for integration tests and benches.

use rand::Rng;

use crate::catalog::{Code, GRID_DIM};
use crate::image::GrayImage;

/// Ratio of the white quiet zone around a marker to the marker size.
const QUIET_ZONE: f64 = 1.4;

/// A marker placed in a synthetic scene.
#[derive(Clone, Debug)]
pub struct MarkerPlacement {
    /// The code grid to print (pass a rotated catalog code to simulate a
    /// physically rotated marker).
    pub code: Code,
    /// Center x in pixels.
    pub center_x: f64,
    /// Center y in pixels.
    pub center_y: f64,
    /// Side length of the printed square in pixels (all 5 cells).
    pub size: f64,
    /// In-plane rotation in radians.
    pub rotation_rad: f64,
}

/// Builder for synthetic grayscale frames containing markers.
pub struct SceneBuilder {
    width: usize,
    height: usize,
    background: u8,
    noise_sigma: f64,
    markers: Vec<MarkerPlacement>,
}

impl SceneBuilder {
    /// Create a builder for a `width` x `height` frame with a white
    /// background.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, background: 255, noise_sigma: 0.0, markers: Vec::new() }
    }

    /// Set the background gray level.
    #[must_use]
    pub fn with_background(mut self, gray: u8) -> Self {
        self.background = gray;
        self
    }

    /// Add uniform noise of the given amplitude at build time.
    #[must_use]
    pub fn with_noise(mut self, sigma: f64) -> Self {
        self.noise_sigma = sigma;
        self
    }

    /// Place a marker.
    #[must_use]
    pub fn add_marker(mut self, placement: MarkerPlacement) -> Self {
        self.markers.push(placement);
        self
    }

    /// Render the frame. Noise, if any, uses the thread RNG; prefer
    /// [`SceneBuilder::build_with_rng`] in tests that need determinism.
    #[must_use]
    pub fn build(self) -> GrayImage {
        let mut rng = rand::thread_rng();
        self.build_with_rng(&mut rng)
    }

    /// Render the frame with a caller-provided RNG for the noise pass.
    #[must_use]
    pub fn build_with_rng<R: Rng>(self, rng: &mut R) -> GrayImage {
        let mut img = GrayImage::zeroed(self.width, self.height);
        img.data.fill(self.background);

        for marker in &self.markers {
            self.draw_marker(&mut img, marker);
        }

        if self.noise_sigma > 0.0 {
            for p in &mut img.data {
                let noise = rng.gen_range(-self.noise_sigma..self.noise_sigma);
                *p = (f64::from(*p) + noise).clamp(0.0, 255.0) as u8;
            }
        }

        img
    }

    fn draw_marker(&self, img: &mut GrayImage, marker: &MarkerPlacement) {
        let cells = (GRID_DIM + 2) as f64;
        let half = marker.size / 2.0;
        let qz_half = half * QUIET_ZONE;
        let cos = marker.rotation_rad.cos();
        let sin = marker.rotation_rad.sin();

        let reach = qz_half * std::f64::consts::SQRT_2;
        let min_x = ((marker.center_x - reach).floor().max(0.0)) as usize;
        let max_x = ((marker.center_x + reach).ceil().min(self.width as f64 - 1.0)) as usize;
        let min_y = ((marker.center_y - reach).floor().max(0.0)) as usize;
        let max_y = ((marker.center_y + reach).ceil().min(self.height as f64 - 1.0)) as usize;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 - marker.center_x;
                let dy = y as f64 - marker.center_y;

                // Inverse-rotate into marker-local coordinates.
                let lx = dx * cos + dy * sin;
                let ly = -dx * sin + dy * cos;

                if lx.abs() > qz_half || ly.abs() > qz_half {
                    continue;
                }

                let value = if lx.abs() > half || ly.abs() > half {
                    255 // quiet zone
                } else {
                    let gx = ((lx + half) / marker.size * cells).floor() as i64;
                    let gy = ((ly + half) / marker.size * cells).floor() as i64;
                    let gx = gx.clamp(0, cells as i64 - 1) as usize;
                    let gy = gy.clamp(0, cells as i64 - 1) as usize;
                    let border =
                        gx == 0 || gy == 0 || gx == GRID_DIM + 1 || gy == GRID_DIM + 1;
                    if border {
                        0
                    } else if marker.code.bit(gy - 1, gx - 1) {
                        255
                    } else {
                        0
                    }
                };
                img.set_pixel(x, y, value);
            }
        }
    }
}
