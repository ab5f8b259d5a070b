//! Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use raster_common::CrsCode;

use crate::error::{PipelineError, Result};
use crate::interpolation::InterpolationMethod;
use crate::merge::MergeMethod;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Merge per-band tiles into one mosaic.
    Merge,
    /// Reproject each band mosaic into the destination CRS.
    Reproject,
    /// Resample to the target resolution.
    Resample,
    /// Stack band outputs into one Zarr array.
    Stack,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Merge => write!(f, "merge"),
            Stage::Reproject => write!(f, "reproject"),
            Stage::Resample => write!(f, "resample"),
            Stage::Stack => write!(f, "stack"),
        }
    }
}

/// One entry in the ordered stage list.
///
/// The original workflow toggled stages by commenting code in and out;
/// here the sequence is explicit configuration with per-stage enable
/// flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageToggle {
    pub stage: Stage,
    pub enabled: bool,
}

impl StageToggle {
    pub fn on(stage: Stage) -> Self {
        Self {
            stage,
            enabled: true,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory containing `<tile_id>_<band>.tif` inputs.
    pub input_dir: PathBuf,

    /// Directory for all stage outputs.
    pub output_dir: PathBuf,

    /// Bands to process, in order.
    pub bands: Vec<String>,

    /// CRS the input tiles are expected in.
    pub src_crs: CrsCode,

    /// Destination CRS for the reproject stage.
    pub dst_crs: CrsCode,

    /// Target resolution for the resample stage, in the units of
    /// `resample_crs`.
    pub target_resolution: f64,

    /// CRS the resample stage works in. When it differs from the current
    /// raster CRS the stage reprojects and resamples in one step.
    pub resample_crs: CrsCode,

    /// Per-pixel reduction for the merge stage.
    pub merge_method: MergeMethod,

    /// Resampling rule for reproject/resample.
    pub interpolation: InterpolationMethod,

    /// Ordered stage list with enable flags.
    pub stages: Vec<StageToggle>,

    /// Name of the stacked Zarr artifact inside `output_dir`.
    pub stack_name: String,

    /// Zarr output settings for the stack stage.
    pub zarr: ZarrConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("soil_rasters"),
            output_dir: PathBuf::from("soil_final"),
            // gSSURGO-derived soil variables
            bands: [
                "nccpi3all",
                "nccpi3corn",
                "nccpi3soy",
                "soc0_150",
                "soc0_999",
                "rootznaws",
                "pctearthmc",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            src_crs: CrsCode::Esri102039,
            dst_crs: CrsCode::Epsg4326,
            target_resolution: 125.0,
            resample_crs: CrsCode::Esri102039,
            merge_method: MergeMethod::Max,
            interpolation: InterpolationMethod::Nearest,
            stages: vec![
                StageToggle::on(Stage::Merge),
                StageToggle::on(Stage::Reproject),
                StageToggle::on(Stage::Resample),
                StageToggle::on(Stage::Stack),
            ],
            stack_name: "soil_stack.zarr".to_string(),
            zarr: ZarrConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(PipelineError::Config("bands must not be empty".to_string()));
        }

        if !(self.target_resolution.is_finite() && self.target_resolution > 0.0) {
            return Err(PipelineError::Config(format!(
                "target_resolution must be > 0, got {}",
                self.target_resolution
            )));
        }

        if !self.stages.iter().any(|s| s.enabled) {
            return Err(PipelineError::Config("all stages are disabled".to_string()));
        }

        for (i, toggle) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|t| t.stage == toggle.stage) {
                return Err(PipelineError::Config(format!(
                    "stage {} listed twice",
                    toggle.stage
                )));
            }
        }

        if self.stack_name.is_empty() {
            return Err(PipelineError::Config("stack_name must not be empty".to_string()));
        }

        self.zarr.validate()
    }

    /// Stages that are enabled, in configured order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.stage)
    }
}

/// Compression codec for the stacked Zarr artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd (recommended).
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zarr output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZarrConfig {
    /// Chunk dimension for the spatial axes (square chunks, one band per
    /// chunk).
    pub chunk_size: usize,

    /// Compression codec.
    pub compression: ZarrCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for ZarrConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            compression: ZarrCompression::BloscZstd,
            // The original workflow compressed its stacked artifact at
            // level 5.
            compression_level: 5,
            shuffle: true,
        }
    }
}

impl ZarrConfig {
    /// Validate the Zarr settings.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Config("zarr chunk_size must be > 0".to_string()));
        }
        if self.compression != ZarrCompression::None
            && (self.compression_level == 0 || self.compression_level > 9)
        {
            return Err(PipelineError::Config(
                "zarr compression_level must be 1-9".to_string(),
            ));
        }
        Ok(())
    }
}
