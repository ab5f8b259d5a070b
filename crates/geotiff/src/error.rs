//! Error types for GeoTIFF I/O.

use thiserror::Error;

/// Errors that can occur reading or writing a GeoTIFF.
#[derive(Error, Debug)]
pub enum GeoTiffError {
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying TIFF container error.
    #[error("tiff error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// A georeferencing tag the reader needs is absent.
    #[error("missing geo tag: {0}")]
    MissingGeoTag(&'static str),

    /// The file's CRS is not one the pipeline supports.
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Valid TIFF, but a shape we do not handle (multi-band, rotated, ...).
    #[error("unsupported geotiff layout: {0}")]
    Unsupported(String),

    /// Pixel data did not match the declared dimensions.
    #[error("invalid raster data: {0}")]
    InvalidData(String),
}

/// Result type for GeoTIFF operations.
pub type Result<T> = std::result::Result<T, GeoTiffError>;
