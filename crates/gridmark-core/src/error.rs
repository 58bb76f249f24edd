//! Error types for the recognition pipeline.
//!
//! Candidate rejection is not an error: filters return `Option` and the
//! chain simply drops the candidate. The variants here cover malformed
//! caller input and defensive geometry checks.

use core::fmt;

/// Errors surfaced to callers of the recognition API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The image has a zero dimension.
    EmptyImage,
    /// The pixel buffer is too small for the stated dimensions.
    BufferTooSmall {
        /// Minimum number of bytes required by width/height/stride.
        required: usize,
        /// Actual buffer length.
        actual: usize,
    },
    /// The row stride is smaller than the image width.
    InvalidStride {
        /// Declared stride in bytes.
        stride: usize,
        /// Declared width in pixels.
        width: usize,
    },
    /// A contour with (near-)zero area reached centroid computation.
    ///
    /// The area filter upstream should make this impossible; hitting it
    /// means the extractor handed over corrupt geometry.
    DegenerateContour,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image has a zero dimension"),
            Self::BufferTooSmall { required, actual } => {
                write!(f, "pixel buffer too small: need {required} bytes, got {actual}")
            }
            Self::InvalidStride { stride, width } => {
                write!(f, "stride ({stride}) is smaller than width ({width})")
            }
            Self::DegenerateContour => write!(f, "zero-area contour reached centroid computation"),
        }
    }
}

impl std::error::Error for Error {}
