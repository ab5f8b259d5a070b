//! North-up affine geotransforms.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Affine mapping from pixel (col, row) to CRS coordinates.
///
/// Only north-up, axis-aligned grids are supported: `pixel_height` is
/// negative (rows increase southward) and there are no rotation terms.
/// Rotated GeoTIFFs are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the top-left corner of pixel (0, 0).
    pub origin_x: f64,
    /// Y coordinate of the top-left corner of pixel (0, 0).
    pub origin_y: f64,
    /// Pixel width in CRS units (positive).
    pub pixel_width: f64,
    /// Pixel height in CRS units (negative for north-up grids).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a north-up transform from the top-left corner and pixel size.
    ///
    /// `pixel_size` is given as positive (width, height); the stored
    /// `pixel_height` is negated.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size_x: f64, pixel_size_y: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width: pixel_size_x,
            pixel_height: -pixel_size_y.abs(),
        }
    }

    /// CRS coordinates of a pixel center.
    pub fn pixel_to_coords(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + (col + 0.5) * self.pixel_width,
            self.origin_y + (row + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel indices of a CRS coordinate.
    ///
    /// Inverse of [`pixel_to_coords`](Self::pixel_to_coords): the returned
    /// (col, row) is fractional, with integer values at pixel centers.
    pub fn coords_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width - 0.5,
            (y - self.origin_y) / self.pixel_height - 0.5,
        )
    }

    /// Bounding box of a grid with this transform and the given shape.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let x0 = self.origin_x;
        let y0 = self.origin_y;
        let x1 = self.origin_x + width as f64 * self.pixel_width;
        let y1 = self.origin_y + height as f64 * self.pixel_height;

        BoundingBox {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Absolute pixel size (width, height) in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Compare two transforms within a tolerance.
    pub fn approx_eq(&self, other: &GeoTransform, epsilon: f64) -> bool {
        (self.origin_x - other.origin_x).abs() <= epsilon
            && (self.origin_y - other.origin_y).abs() <= epsilon
            && (self.pixel_width - other.pixel_width).abs() <= epsilon
            && (self.pixel_height - other.pixel_height).abs() <= epsilon
    }
}
