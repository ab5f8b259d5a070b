//! Shared geospatial types for the soil raster pipeline.
//!
//! Everything in this crate is a plain value type: a [`Raster`] is an
//! immutable grid of samples that always travels together with its
//! [`GeoTransform`] and [`CrsCode`]. Pipeline stages consume rasters and
//! produce new ones; nothing here is mutated in place.

mod bbox;
mod crs;
mod raster;
mod transform;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use raster::Raster;
pub use transform::GeoTransform;
