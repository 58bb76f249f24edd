//! The accepted recognition result and its derived geometry.

use std::f64::consts::TAU;

use crate::contour::{moments, Point};
use crate::error::Error;

/// A recognized marker.
///
/// Constructed once per accepted candidate, never mutated. Position,
/// corner lists, and the major axis are derived at construction time from
/// the contour, polygon, and matched rotation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Matched catalog identity (1-6 with the built-in catalog).
    pub id: u32,
    /// Raw boundary as returned by the extractor.
    pub contour: Vec<Point>,
    /// Approximated quadrilateral in original image coordinates, in the
    /// extractor's vertex order (not the winding-normalized order used
    /// for rectification).
    pub polygon: [Point; 4],
    /// Number of 90-degree CCW rotations aligning the catalog pattern
    /// with the observed code.
    pub rotations: u8,
    /// Area-weighted centroid of the contour, truncated to pixels.
    pub position: (i32, i32),
    /// Polygon vertex x coordinates, in polygon order.
    pub corners_x: [i32; 4],
    /// Polygon vertex y coordinates, in polygon order.
    pub corners_y: [i32; 4],
    /// Rotation-adjusted midpoint of the reference edge; together with
    /// `position` it defines the marker's facing direction.
    pub major_axis: (i32, i32),
}

impl Marker {
    /// Build a marker and derive its geometry.
    ///
    /// Fails with [`Error::DegenerateContour`] when the contour encloses
    /// no area; the extractor's area filter makes that unreachable in the
    /// normal pipeline, so hitting it indicates corrupt candidate state.
    pub fn new(
        id: u32,
        contour: Vec<Point>,
        polygon: [Point; 4],
        rotations: u8,
    ) -> Result<Self, Error> {
        let position = moments(&contour).centroid().ok_or(Error::DegenerateContour)?;

        let corners_x = [polygon[0].x, polygon[1].x, polygon[2].x, polygon[3].x];
        let corners_y = [polygon[0].y, polygon[1].y, polygon[2].y, polygon[3].y];

        // The reference edge rotates in lock-step with the printed
        // pattern, so the axis tracks the same printed feature however
        // the marker is physically turned. Midpoints truncate.
        let r = rotations as usize;
        let a = (4 - r) % 4;
        let b = (5 - r) % 4;
        let major_axis = (
            corners_x[a] + (corners_x[b] - corners_x[a]) / 2,
            corners_y[a] + (corners_y[b] - corners_y[a]) / 2,
        );

        Ok(Self { id, contour, polygon, rotations, position, corners_x, corners_y, major_axis })
    }

    /// Polygon vertices as `(x, y)` pairs, in polygon order.
    #[must_use]
    pub fn corners(&self) -> [(i32, i32); 4] {
        [
            (self.corners_x[0], self.corners_y[0]),
            (self.corners_x[1], self.corners_y[1]),
            (self.corners_x[2], self.corners_y[2]),
            (self.corners_x[3], self.corners_y[3]),
        ]
    }

    /// Bearing from the marker's facing direction to an image point, in
    /// integer degrees.
    ///
    /// Angles use the `atan2(dx, dy)` argument order; this defines the
    /// angle convention and must not be swapped. Both intermediate angles
    /// are wrapped into [0, 2pi) but the final difference is returned
    /// as-is and may be negative.
    #[must_use]
    pub fn angle_to_point(&self, point: (i32, i32)) -> i32 {
        let (ax, ay) = self.major_axis;
        let (bx, by) = self.position;
        let (cx, cy) = point;

        let mut phi = f64::from(ax - bx).atan2(f64::from(ay - by));
        if phi < 0.0 {
            phi += TAU;
        }
        let mut rho = f64::from(cx - bx).atan2(f64::from(cy - by));
        if rho < 0.0 {
            rho += TAU;
        }

        (rho - phi).to_degrees().round() as i32
    }
}
