//! Single-band GeoTIFF reading and writing.
//!
//! A deliberately small subset of the GeoTIFF spec, enough to round-trip
//! the soil-survey rasters: one band, north-up affine georeferencing via
//! ModelPixelScale + ModelTiepoint, CRS via the GeoKey directory, nodata
//! via the GDAL nodata tag. Rotated files are rejected rather than
//! misread.

mod error;
mod reader;
mod tags;
mod writer;

pub use error::{GeoTiffError, Result};
pub use reader::{inspect, read_raster, RasterInfo};
pub use writer::write_raster;
