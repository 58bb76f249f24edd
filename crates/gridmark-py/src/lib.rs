//! Python bindings for the gridmark library.
#![allow(unsafe_code)]

use gridmark_core::ImageView;
use numpy::{PyArrayMethods, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::prelude::*;

// ============================================================================
// Marker and stats (Python-compatible wrappers)
// ============================================================================

/// A recognized marker.
#[pyclass]
#[derive(Clone)]
pub struct Marker {
    /// Catalog identity (1-6).
    #[pyo3(get)]
    pub id: u32,
    /// Centroid of the marker contour (x, y).
    #[pyo3(get)]
    pub position: (i32, i32),
    /// Quadrilateral corners as (x, y) pairs, in polygon order.
    #[pyo3(get)]
    pub corners: [(i32, i32); 4],
    /// Number of 90-degree rotations matched against the catalog.
    #[pyo3(get)]
    pub rotations: u8,
    /// Rotation-adjusted reference point defining the facing direction.
    #[pyo3(get)]
    pub major_axis: (i32, i32),
    inner: gridmark_core::Marker,
}

#[pymethods]
impl Marker {
    /// Bearing from the marker's facing direction to an image point, in
    /// integer degrees (may be negative).
    fn angle_to_point(&self, point: (i32, i32)) -> i32 {
        self.inner.angle_to_point(point)
    }

    fn __repr__(&self) -> String {
        format!(
            "Marker(id={}, position=({}, {}), rotations={})",
            self.id, self.position.0, self.position.1, self.rotations
        )
    }
}

impl From<gridmark_core::Marker> for Marker {
    fn from(m: gridmark_core::Marker) -> Self {
        Self {
            id: m.id,
            position: m.position,
            corners: m.corners(),
            rotations: m.rotations,
            major_axis: m.major_axis,
            inner: m,
        }
    }
}

/// Per-call pipeline statistics.
#[pyclass]
#[derive(Clone, Default)]
pub struct PipelineStats {
    /// Median blur time (ms).
    #[pyo3(get)]
    pub blur_ms: f64,
    /// Global threshold time (ms).
    #[pyo3(get)]
    pub threshold_ms: f64,
    /// Contour tracing time (ms).
    #[pyo3(get)]
    pub contour_ms: f64,
    /// Candidate decode time (ms).
    #[pyo3(get)]
    pub decode_ms: f64,
    /// Total time (ms).
    #[pyo3(get)]
    pub total_ms: f64,
    /// Raw contour count.
    #[pyo3(get)]
    pub num_contours: usize,
    /// Quad candidates surviving the shape filters.
    #[pyo3(get)]
    pub num_candidates: usize,
    /// Candidates rejected by the border validator.
    #[pyo3(get)]
    pub num_rejected_border: usize,
    /// Candidates matching no catalog pattern.
    #[pyo3(get)]
    pub num_rejected_code: usize,
    /// Accepted markers.
    #[pyo3(get)]
    pub num_markers: usize,
}

impl From<gridmark_core::PipelineStats> for PipelineStats {
    fn from(s: gridmark_core::PipelineStats) -> Self {
        Self {
            blur_ms: s.blur_ms,
            threshold_ms: s.threshold_ms,
            contour_ms: s.contour_ms,
            decode_ms: s.decode_ms,
            total_ms: s.total_ms,
            num_contours: s.num_contours,
            num_candidates: s.num_candidates,
            num_rejected_border: s.num_rejected_border,
            num_rejected_code: s.num_rejected_code,
            num_markers: s.num_markers,
        }
    }
}

// ============================================================================
// Detector class with persistent state
// ============================================================================

/// The main recognizer class.
///
/// Example:
///     detector = gridmark.Detector()
///     markers = detector.recognize(image)
///
///     # With custom config
///     detector = gridmark.Detector(min_contour_area=250.0, cell_size=30)
#[pyclass]
pub struct Detector {
    inner: gridmark_core::Detector,
}

#[pymethods]
impl Detector {
    /// Create a new detector with optional configuration.
    ///
    /// Args:
    ///     median_blur: Apply a 5x5 median blur first (default: True)
    ///     binary_threshold: Global ink/background threshold (default: 100)
    ///     min_contour_area: Minimum candidate area in px^2 (default: 100.0)
    ///     poly_epsilon_ratio: Polygon tolerance vs arc length (default: 0.05)
    ///     cell_size: Canonical bitmap cell size in px (default: 60)
    ///     border_mean_max: Max border strip mean (default: 10.0)
    ///     bit_mean_min: Min cell mean for a 1 bit (default: 200.0)
    #[new]
    #[pyo3(signature = (
        median_blur = true,
        binary_threshold = 100,
        min_contour_area = 100.0,
        poly_epsilon_ratio = 0.05,
        cell_size = 60,
        border_mean_max = 10.0,
        bit_mean_min = 200.0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        median_blur: bool,
        binary_threshold: u8,
        min_contour_area: f64,
        poly_epsilon_ratio: f64,
        cell_size: usize,
        border_mean_max: f64,
        bit_mean_min: f64,
    ) -> Self {
        let config = gridmark_core::DetectorConfig {
            median_blur,
            binary_threshold,
            min_contour_area,
            poly_epsilon_ratio,
            cell_size,
            border_mean_max,
            bit_mean_min,
        };
        Self { inner: gridmark_core::Detector::with_config(config) }
    }

    /// Recognize all markers in a grayscale image.
    #[allow(clippy::needless_pass_by_value)]
    fn recognize(&self, img: PyReadonlyArray2<u8>) -> PyResult<Vec<Marker>> {
        let view = create_image_view(&img)?;
        let markers = self.inner.recognize(&view).map_err(to_py_err)?;
        Ok(markers.into_iter().map(Marker::from).collect())
    }

    /// Recognize only the marker with the given identity, stopping at the
    /// first hit. Returns None if absent.
    #[allow(clippy::needless_pass_by_value)]
    fn recognize_by_id(&self, img: PyReadonlyArray2<u8>, id: u32) -> PyResult<Option<Marker>> {
        let view = create_image_view(&img)?;
        let marker = self.inner.recognize_by_id(&view, id).map_err(to_py_err)?;
        Ok(marker.map(Marker::from))
    }

    /// Recognize markers and return per-stage timing statistics.
    #[allow(clippy::needless_pass_by_value)]
    fn recognize_with_stats(
        &self,
        img: PyReadonlyArray2<u8>,
    ) -> PyResult<(Vec<Marker>, PipelineStats)> {
        let view = create_image_view(&img)?;
        let (markers, stats) = self.inner.recognize_with_stats(&view).map_err(to_py_err)?;
        Ok((markers.into_iter().map(Marker::from).collect(), PipelineStats::from(stats)))
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn to_py_err(err: gridmark_core::Error) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// Create an ImageView from a PyReadonlyArray2, validating strides.
#[allow(clippy::cast_sign_loss)]
fn create_image_view<'a>(img: &'a PyReadonlyArray2<'a, u8>) -> PyResult<ImageView<'a>> {
    let shape = img.shape();
    let height = shape[0];
    let width = shape[1];
    let strides = img.strides();
    let stride = strides[0] as usize;

    if strides[1] != 1 {
        return Err(pyo3::exceptions::PyValueError::new_err(
            "Image must have C-contiguous rows (inner stride must be 1)",
        ));
    }

    let required_size = if height > 0 && width > 0 { (height - 1) * stride + width } else { 0 };

    let data = unsafe { std::slice::from_raw_parts(img.data(), required_size) };
    ImageView::new(data, width, height, stride).map_err(to_py_err)
}

// ============================================================================
// Function-based convenience API
// ============================================================================

/// Recognize all markers in a grayscale image with default settings.
#[pyfunction]
#[allow(clippy::needless_pass_by_value)]
fn find_markers(img: PyReadonlyArray2<u8>) -> PyResult<Vec<Marker>> {
    let view = create_image_view(&img)?;
    let detector = gridmark_core::Detector::new();
    let markers = detector.recognize(&view).map_err(to_py_err)?;
    Ok(markers.into_iter().map(Marker::from).collect())
}

/// Recognize the marker with a specific identity, or None.
#[pyfunction]
#[allow(clippy::needless_pass_by_value)]
fn find_marker_with_id(img: PyReadonlyArray2<u8>, id: u32) -> PyResult<Option<Marker>> {
    let view = create_image_view(&img)?;
    let detector = gridmark_core::Detector::new();
    let marker = detector.recognize_by_id(&view, id).map_err(to_py_err)?;
    Ok(marker.map(Marker::from))
}

// ============================================================================
// Module registration
// ============================================================================

/// The gridmark Python module.
#[pymodule]
fn gridmark(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Marker>()?;
    m.add_class::<PipelineStats>()?;
    m.add_class::<Detector>()?;

    m.add_function(wrap_pyfunction!(find_markers, m)?)?;
    m.add_function(wrap_pyfunction!(find_marker_with_id, m)?)?;
    Ok(())
}
