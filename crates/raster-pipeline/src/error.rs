//! Error types for pipeline stages.

use raster_common::CrsCode;
use thiserror::Error;

/// Errors that can occur in a pipeline stage.
///
/// Each stage validates its own preconditions and fails here instead of
/// producing a silently wrong raster.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or unreadable inputs, or an empty tile set.
    #[error("input error: {0}")]
    Input(String),

    /// Tiles in one merge set disagree on CRS.
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: CrsCode, found: CrsCode },

    /// The destination transform could not be computed.
    #[error("reprojection failed: {0}")]
    Reprojection(String),

    /// Stacking inputs whose grids disagree.
    #[error("shape mismatch: expected {expected}, found {found} in {input}")]
    ShapeMismatch {
        expected: String,
        found: String,
        input: String,
    },

    /// GeoTIFF read/write failure.
    #[error("geotiff error: {0}")]
    GeoTiff(#[from] geotiff::GeoTiffError),

    /// Zarr/filesystem storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
