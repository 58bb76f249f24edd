//! Core recognition logic for the gridmark library.
//!
//! gridmark recognizes square fiducial markers carrying a 3x3 binary code
//! inside a black border, and reports each marker's identity, image-plane
//! position, and orientation.
//!
//! # Architecture Overview
//!
//! The pipeline runs leaf-first over a single grayscale frame:
//!
//! 1. **Preprocessing**: optional 5x5 median blur, then a fixed global
//!    threshold separating marker ink from background.
//! 2. **Contour extraction**: Suzuki border following over the binary
//!    raster (outer and hole borders).
//! 3. **Candidate filtering**: area filter, polygon approximation at 5%
//!    of arc length, exactly-four-vertices filter, convexity check.
//! 4. **Rectification and decoding**: winding-aware perspective warp into
//!    the canonical square bitmap, Otsu binarization, black-border
//!    validation, 3x3 block-average bit sampling.
//! 5. **Matching**: fixed-order scan of the pattern catalog under all
//!    four rotations; the first exact match wins.
//!
//! Candidates are independent, so stage 3-5 runs as a pure function per
//! contour and fans out across threads. A rejected candidate is silently
//! dropped; there are no retries and no state survives the call.
//!
//! # Example
//!
//! ```
//! use gridmark_core::{Detector, ImageView};
//! use gridmark_core::config::DetectorConfig;
//!
//! let config = DetectorConfig::builder().min_contour_area(50.0).build();
//! let detector = Detector::with_config(config);
//!
//! # let pixels = vec![255u8; 64 * 64];
//! let img = ImageView::new(&pixels, 64, 64, 64)?;
//! let markers = detector.recognize(&img)?;
//! assert!(markers.is_empty());
//! # Ok::<(), gridmark_core::Error>(())
//! ```

/// The marker pattern catalog and code-grid rotation.
pub mod catalog;
/// Configuration for the recognition pipeline.
pub mod config;
/// Contour extraction and polygon geometry.
pub mod contour;
/// Candidate rectification, border validation, and bit sampling.
pub mod decoder;
/// Error types.
pub mod error;
/// Denoise filtering.
pub mod filter;
/// Image views and owned rasters.
pub mod image;
/// The recognition result and its derived geometry.
pub mod marker;
/// Candidate quadrilateral extraction.
pub mod quad;
/// Synthetic data generation for tests and benches.
pub mod test_utils;
/// Image binarization.
pub mod threshold;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use bumpalo::Bump;
use rayon::prelude::*;

pub use crate::catalog::{Catalog, Code, BUILTIN_CATALOG};
pub use crate::config::DetectorConfig;
pub use crate::error::Error;
pub use crate::image::ImageView;
pub use crate::marker::Marker;

use crate::contour::Contour;
use crate::image::GrayImage;
use crate::quad::winding;

/// Per-call statistics for the recognition pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineStats {
    /// Time spent in the median blur, in milliseconds.
    pub blur_ms: f64,
    /// Time spent in global thresholding, in milliseconds.
    pub threshold_ms: f64,
    /// Time spent tracing contours, in milliseconds.
    pub contour_ms: f64,
    /// Time spent filtering, rectifying, and decoding candidates.
    pub decode_ms: f64,
    /// Total call time in milliseconds.
    pub total_ms: f64,
    /// Number of raw contours the extractor produced.
    pub num_contours: usize,
    /// Number of candidates surviving the shape filters.
    pub num_candidates: usize,
    /// Candidates rejected by the black-border validator.
    pub num_rejected_border: usize,
    /// Candidates whose code matched no catalog entry.
    pub num_rejected_code: usize,
    /// Candidates dropped defensively for degenerate geometry.
    pub num_degenerate: usize,
    /// Number of accepted markers.
    pub num_markers: usize,
}

/// Rejection counters shared across the parallel decode stage.
#[derive(Default)]
struct Counters {
    candidates: AtomicUsize,
    rejected_border: AtomicUsize,
    rejected_code: AtomicUsize,
    degenerate: AtomicUsize,
}

/// The main entry point for recognizing markers.
///
/// Holds the pipeline configuration and the pattern catalog. The catalog
/// is injected at construction and never mutated, so a `Detector` is safe
/// to share across threads.
pub struct Detector {
    config: DetectorConfig,
    catalog: Catalog,
}

impl Detector {
    /// Create a detector with default configuration and the built-in
    /// six-pattern catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    /// Create a detector with custom configuration and the built-in
    /// catalog.
    #[must_use]
    pub fn with_config(config: DetectorConfig) -> Self {
        Self::with_catalog(config, BUILTIN_CATALOG.clone())
    }

    /// Create a detector with a custom catalog (tests substitute
    /// alternate pattern sets this way).
    #[must_use]
    pub fn with_catalog(config: DetectorConfig, catalog: Catalog) -> Self {
        Self { config, catalog }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// The active catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Recognize every marker in the frame.
    ///
    /// Candidate order in the result is unspecified.
    pub fn recognize(&self, img: &ImageView) -> Result<Vec<Marker>, Error> {
        self.recognize_with_stats(img).map(|(markers, _)| markers)
    }

    /// Recognize every marker and report per-stage statistics.
    pub fn recognize_with_stats(
        &self,
        img: &ImageView,
    ) -> Result<(Vec<Marker>, PipelineStats), Error> {
        let start_total = Instant::now();
        let (gray, contours, mut stats) = self.prepare(img)?;
        let gray_view = gray.view();

        let start_decode = Instant::now();
        let counters = Counters::default();
        let markers: Vec<Marker> = {
            let _span = tracing::info_span!("decode_candidates").entered();
            contours
                .par_iter()
                .filter_map(|contour| self.examine_candidate(&gray_view, contour, &counters))
                .collect()
        };
        stats.decode_ms = start_decode.elapsed().as_secs_f64() * 1000.0;

        stats.num_candidates = counters.candidates.load(Ordering::Relaxed);
        stats.num_rejected_border = counters.rejected_border.load(Ordering::Relaxed);
        stats.num_rejected_code = counters.rejected_code.load(Ordering::Relaxed);
        stats.num_degenerate = counters.degenerate.load(Ordering::Relaxed);
        stats.num_markers = markers.len();
        stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;

        Ok((markers, stats))
    }

    /// Recognize only the marker with the given identity, stopping at the
    /// first hit.
    pub fn recognize_by_id(&self, img: &ImageView, id: u32) -> Result<Option<Marker>, Error> {
        let (gray, contours, _) = self.prepare(img)?;
        let gray_view = gray.view();
        let counters = Counters::default();

        let marker = {
            let _span = tracing::info_span!("decode_candidates", target_id = id).entered();
            contours.par_iter().find_map_first(|contour| {
                self.examine_candidate(&gray_view, contour, &counters)
                    .filter(|marker| marker.id == id)
            })
        };
        Ok(marker)
    }

    /// Shared front half of the pipeline: validate, blur, threshold,
    /// trace contours.
    fn prepare(&self, img: &ImageView) -> Result<(GrayImage, Vec<Contour>, PipelineStats), Error> {
        if img.width == 0 || img.height == 0 {
            return Err(Error::EmptyImage);
        }

        let mut stats = PipelineStats::default();

        let start_blur = Instant::now();
        let mut gray = GrayImage::zeroed(img.width, img.height);
        if self.config.median_blur {
            let _span = tracing::info_span!("median_blur").entered();
            filter::median_blur(img, &mut gray.data);
        } else {
            for y in 0..img.height {
                gray.data[y * img.width..(y + 1) * img.width].copy_from_slice(img.row(y));
            }
        }
        stats.blur_ms = start_blur.elapsed().as_secs_f64() * 1000.0;

        let start_thresh = Instant::now();
        let mut binary = GrayImage::zeroed(img.width, img.height);
        {
            let _span = tracing::info_span!("threshold").entered();
            threshold::threshold_binary(
                &gray.view(),
                self.config.binary_threshold,
                &mut binary.data,
            );
        }
        stats.threshold_ms = start_thresh.elapsed().as_secs_f64() * 1000.0;

        let start_contours = Instant::now();
        let contours = {
            let _span = tracing::info_span!("find_contours").entered();
            contour::find_contours(&binary.view())
        };
        stats.contour_ms = start_contours.elapsed().as_secs_f64() * 1000.0;
        stats.num_contours = contours.len();

        Ok((gray, contours, stats))
    }

    /// The per-candidate filter chain: a pure function from (image,
    /// contour) to an optional marker, safe to run concurrently.
    fn examine_candidate(
        &self,
        gray: &ImageView,
        contour: &Contour,
        counters: &Counters,
    ) -> Option<Marker> {
        let arena = Bump::new();
        let polygon = quad::filter_quad(&arena, &contour.points, &self.config)?;
        counters.candidates.fetch_add(1, Ordering::Relaxed);

        let mut bitmap =
            decoder::rectify(gray, &polygon, winding(&polygon), self.config.cell_size)?;
        threshold::binarize_otsu(&mut bitmap);

        if !decoder::has_dark_border(&bitmap, self.config.cell_size, self.config.border_mean_max) {
            counters.rejected_border.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let code = decoder::read_code(&bitmap, self.config.cell_size, self.config.bit_mean_min);
        let Some((id, rotations)) = self.catalog.match_code(code) else {
            counters.rejected_code.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match Marker::new(id, contour.points.clone(), polygon, rotations) {
            Ok(marker) => Some(marker),
            Err(_) => {
                // A zero-area contour slipping past the area filter means
                // the extractor state is inconsistent; drop the candidate
                // rather than poisoning the whole pass.
                tracing::warn!(id, "degenerate contour reached centroid computation");
                counters.degenerate.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_is_rejected() {
        let detector = Detector::new();
        let img = ImageView::new(&[], 0, 0, 0).unwrap();
        assert_eq!(detector.recognize(&img).unwrap_err(), Error::EmptyImage);
    }

    #[test]
    fn blank_image_yields_no_markers() {
        let detector = Detector::new();
        let pixels = vec![255u8; 64 * 64];
        let img = ImageView::new(&pixels, 64, 64, 64).unwrap();
        let (markers, stats) = detector.recognize_with_stats(&img).unwrap();
        assert!(markers.is_empty());
        assert_eq!(stats.num_markers, 0);
    }

    #[test]
    fn detector_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Detector>();
    }
}
