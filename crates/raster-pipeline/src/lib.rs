//! Soil raster processing pipeline.
//!
//! Takes per-tile, per-band GeoTIFFs and produces analysis-ready rasters
//! in four stages: merge tiles into a band mosaic, reproject to the
//! destination CRS, resample to the target resolution, and stack the
//! bands into one multi-band Zarr artifact. Stages are individually
//! toggleable and run per band with failure isolation.

pub mod batch;
pub mod config;
pub mod error;
pub mod interpolation;
pub mod merge;
pub mod reproject;
pub mod resample;
pub mod stack;

pub use batch::{run, BandFailure, BatchReport};
pub use config::{PipelineConfig, Stage, StageToggle, ZarrCompression, ZarrConfig};
pub use error::{PipelineError, Result};
pub use interpolation::InterpolationMethod;
pub use merge::{discover_tiles, merge, merge_band, MergeMethod};
pub use reproject::{compute_default_transform, reproject, ReprojectOptions};
pub use resample::{resample, resample_to_crs};
pub use stack::{stack_bands, StackSummary};
