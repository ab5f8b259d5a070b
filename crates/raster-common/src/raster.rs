//! The in-memory raster value type.

use crate::{BoundingBox, CrsCode, GeoTransform};

/// A single-band raster: pixel grid plus the georeferencing that makes it
/// meaningful.
///
/// Samples are `f32` in row-major order (top-to-bottom, left-to-right).
/// Missing pixels are NaN in memory; `nodata` records the sentinel used in
/// the file the raster came from (or should be written with). Rasters are
/// never mutated by pipeline stages, each stage builds a new one.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Pixel values, row-major, NaN for missing.
    pub data: Vec<f32>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Affine transform from pixel to CRS coordinates.
    pub transform: GeoTransform,
    /// Coordinate reference system of the transform.
    pub crs: CrsCode,
    /// Nodata sentinel for on-disk representation, if any.
    pub nodata: Option<f64>,
}

impl Raster {
    /// Create a raster, checking that the data length matches the shape.
    ///
    /// Returns `None` when `data.len() != width * height`.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        nodata: Option<f64>,
    ) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        })
    }

    /// A raster of the given shape filled with NaN.
    pub fn filled_nan(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        nodata: Option<f64>,
    ) -> Self {
        Self {
            data: vec![f32::NAN; width * height],
            width,
            height,
            transform,
            crs,
            nodata,
        }
    }

    /// Value at (col, row), or `None` when out of range.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Grid shape as (width, height).
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Bounding box in the raster's CRS.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Absolute pixel size (width, height) in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    /// Number of pixels carrying a valid (non-NaN) value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
