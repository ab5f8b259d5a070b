//! Map projection math for the soil raster pipeline.
//!
//! Provides the Albers Equal Area Conic projection used by the soil-survey
//! source data (ESRI:102039 / EPSG:5070) and CRS-dispatched point
//! transforms between any pair of supported CRS codes. All math is
//! closed-form on a spherical earth.

mod albers;

pub use albers::AlbersEqualArea;

use raster_common::CrsCode;
use thiserror::Error;

/// Errors from projection math.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The point cannot be represented in the target projection.
    #[error("point ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { x: f64, y: f64, crs: CrsCode },

    /// Coordinates were not finite.
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Convert a point in `crs` to WGS84 (lon, lat) degrees.
pub fn to_lonlat(crs: CrsCode, x: f64, y: f64) -> Result<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ProjectionError::NonFinite { x, y });
    }
    match crs {
        CrsCode::Epsg4326 => Ok((x, y)),
        CrsCode::Epsg5070 | CrsCode::Esri102039 => AlbersEqualArea::conus()
            .inverse(x, y)
            .ok_or(ProjectionError::OutOfDomain { x, y, crs }),
    }
}

/// Convert WGS84 (lon, lat) degrees to a point in `crs`.
pub fn from_lonlat(crs: CrsCode, lon: f64, lat: f64) -> Result<(f64, f64)> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(ProjectionError::NonFinite { x: lon, y: lat });
    }
    match crs {
        CrsCode::Epsg4326 => Ok((lon, lat)),
        CrsCode::Epsg5070 | CrsCode::Esri102039 => {
            Ok(AlbersEqualArea::conus().forward(lon, lat))
        }
    }
}

/// Transform a point between two supported CRS codes, routing through
/// lon/lat when the codes differ.
pub fn transform_point(src: CrsCode, dst: CrsCode, x: f64, y: f64) -> Result<(f64, f64)> {
    if src == dst {
        return Ok((x, y));
    }
    let (lon, lat) = to_lonlat(src, x, y)?;
    from_lonlat(dst, lon, lat)
}
