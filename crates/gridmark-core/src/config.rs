//! Configuration for the recognition pipeline.
//!
//! [`DetectorConfig`] carries every pipeline threshold. It is immutable
//! after the `Detector` is constructed; use the builder for ergonomic
//! construction.

/// Pipeline-level configuration for the detector.
///
/// The defaults assume markers printed at the 60px-per-cell scale.
///
/// # Example
/// ```
/// use gridmark_core::config::DetectorConfig;
///
/// let config = DetectorConfig::builder()
///     .min_contour_area(250.0)
///     .cell_size(30)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorConfig {
    /// Apply a 5x5 median blur before thresholding (default: true).
    pub median_blur: bool,
    /// Fixed global threshold separating marker ink from background
    /// (default: 100). Pixels above it are treated as background.
    pub binary_threshold: u8,
    /// Contours whose enclosed area is at or below this value are
    /// discarded as noise (default: 100.0 square pixels).
    pub min_contour_area: f64,
    /// Polygon approximation tolerance as a fraction of the contour's
    /// closed arc length (default: 0.05).
    pub poly_epsilon_ratio: f64,
    /// Side length in pixels of one grid cell in the canonical bitmap
    /// (default: 60). The bitmap is 5 cells on a side: one border cell on
    /// each edge around the 3x3 code grid.
    pub cell_size: usize,
    /// Maximum combined mean intensity of the canonical bitmap's four
    /// border strips (default: 10.0). Candidates whose border is brighter
    /// lack the printed black frame.
    pub border_mean_max: f64,
    /// Minimum block-average intensity for a code cell to read as a 1 bit
    /// (default: 200.0).
    pub bit_mean_min: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            median_blur: true,
            binary_threshold: 100,
            min_contour_area: 100.0,
            poly_epsilon_ratio: 0.05,
            cell_size: 60,
            border_mean_max: 10.0,
            bit_mean_min: 200.0,
        }
    }
}

impl DetectorConfig {
    /// Create a new builder for `DetectorConfig`.
    #[must_use]
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::default()
    }

    /// Side length in pixels of the canonical bitmap (5 cells).
    #[must_use]
    pub fn canonical_size(&self) -> usize {
        self.cell_size * 5
    }
}

/// Builder for [`DetectorConfig`].
#[derive(Default)]
pub struct DetectorConfigBuilder {
    median_blur: Option<bool>,
    binary_threshold: Option<u8>,
    min_contour_area: Option<f64>,
    poly_epsilon_ratio: Option<f64>,
    cell_size: Option<usize>,
    border_mean_max: Option<f64>,
    bit_mean_min: Option<f64>,
}

impl DetectorConfigBuilder {
    /// Enable or disable the median blur preprocessing step.
    #[must_use]
    pub fn median_blur(mut self, enabled: bool) -> Self {
        self.median_blur = Some(enabled);
        self
    }

    /// Set the fixed binarization threshold.
    #[must_use]
    pub fn binary_threshold(mut self, threshold: u8) -> Self {
        self.binary_threshold = Some(threshold);
        self
    }

    /// Set the minimum contour area.
    #[must_use]
    pub fn min_contour_area(mut self, area: f64) -> Self {
        self.min_contour_area = Some(area);
        self
    }

    /// Set the polygon approximation tolerance ratio.
    #[must_use]
    pub fn poly_epsilon_ratio(mut self, ratio: f64) -> Self {
        self.poly_epsilon_ratio = Some(ratio);
        self
    }

    /// Set the canonical bitmap cell size in pixels.
    #[must_use]
    pub fn cell_size(mut self, size: usize) -> Self {
        self.cell_size = Some(size);
        self
    }

    /// Set the border darkness acceptance threshold.
    #[must_use]
    pub fn border_mean_max(mut self, mean: f64) -> Self {
        self.border_mean_max = Some(mean);
        self
    }

    /// Set the cell brightness threshold for a 1 bit.
    #[must_use]
    pub fn bit_mean_min(mut self, mean: f64) -> Self {
        self.bit_mean_min = Some(mean);
        self
    }

    /// Build the configuration, falling back to defaults for unset fields.
    #[must_use]
    pub fn build(self) -> DetectorConfig {
        let defaults = DetectorConfig::default();
        DetectorConfig {
            median_blur: self.median_blur.unwrap_or(defaults.median_blur),
            binary_threshold: self.binary_threshold.unwrap_or(defaults.binary_threshold),
            min_contour_area: self.min_contour_area.unwrap_or(defaults.min_contour_area),
            poly_epsilon_ratio: self.poly_epsilon_ratio.unwrap_or(defaults.poly_epsilon_ratio),
            cell_size: self.cell_size.unwrap_or(defaults.cell_size),
            border_mean_max: self.border_mean_max.unwrap_or(defaults.border_mean_max),
            bit_mean_min: self.bit_mean_min.unwrap_or(defaults.bit_mean_min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_documented_constants() {
        let config = DetectorConfig::builder().build();
        assert_eq!(config, DetectorConfig::default());
        assert_eq!(config.binary_threshold, 100);
        assert_eq!(config.cell_size, 60);
        assert_eq!(config.canonical_size(), 300);
    }

    #[test]
    fn builder_overrides_single_field() {
        let config = DetectorConfig::builder().cell_size(30).build();
        assert_eq!(config.cell_size, 30);
        assert_eq!(config.canonical_size(), 150);
        assert_eq!(config.binary_threshold, 100);
    }
}
