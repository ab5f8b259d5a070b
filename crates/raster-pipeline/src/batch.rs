//! Batch execution across bands.
//!
//! Runs the configured stage sequence once per band. A failing band is
//! recorded and skipped; the remaining bands still run, and the stack
//! stage at the end only sees the bands that made it through.

use std::path::PathBuf;

use tracing::{info, warn};

use raster_common::CrsCode;

use crate::config::{PipelineConfig, Stage};
use crate::error::{PipelineError, Result};
use crate::merge::merge_band;
use crate::reproject::{reproject, ReprojectOptions};
use crate::resample::resample_to_crs;
use crate::stack::{stack_bands, StackSummary};

/// One band that failed, and where.
#[derive(Debug)]
pub struct BandFailure {
    pub band: String,
    pub stage: Stage,
    pub error: PipelineError,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Bands that completed every per-band stage, with their final
    /// artifact path.
    pub completed: Vec<(String, PathBuf)>,
    /// Bands that failed, with the stage that failed them.
    pub failures: Vec<BandFailure>,
    /// Stack output, when the stack stage ran.
    pub stack: Option<StackSummary>,
}

impl BatchReport {
    /// True when every band completed and the stack (if enabled) wrote.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the configured pipeline over all bands.
///
/// Per-band stages run in configured order for each band in turn; the
/// stack stage runs once at the end over the surviving bands.
pub fn run(config: &PipelineConfig) -> Result<BatchReport> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir)?;

    let per_band: Vec<Stage> = config
        .enabled_stages()
        .filter(|s| *s != Stage::Stack)
        .collect();
    let stack_enabled = config.enabled_stages().any(|s| s == Stage::Stack);

    let mut completed = Vec::new();
    let mut failures = Vec::new();

    for band in &config.bands {
        match run_band(config, band, &per_band) {
            Ok(path) => {
                info!(band, output = %path.display(), "band complete");
                completed.push((band.clone(), path));
            }
            Err((stage, error)) => {
                warn!(band, %stage, %error, "band failed, continuing with remaining bands");
                failures.push(BandFailure {
                    band: band.clone(),
                    stage,
                    error,
                });
            }
        }
    }

    let stack = if stack_enabled && !completed.is_empty() {
        let out = config.output_dir.join(&config.stack_name);
        match stack_bands(&completed, &out, &config.zarr) {
            Ok(summary) => Some(summary),
            Err(error) => {
                warn!(%error, "stack stage failed");
                failures.push(BandFailure {
                    band: "<stack>".to_string(),
                    stage: Stage::Stack,
                    error,
                });
                None
            }
        }
    } else {
        None
    };

    info!(
        completed = completed.len(),
        failed = failures.len(),
        stacked = stack.is_some(),
        "batch finished"
    );

    Ok(BatchReport {
        completed,
        failures,
        stack,
    })
}

/// Run the per-band stages for one band, returning its final artifact.
fn run_band(
    config: &PipelineConfig,
    band: &str,
    stages: &[Stage],
) -> std::result::Result<PathBuf, (Stage, PipelineError)> {
    // Each stage reads its predecessor's artifact, so a disabled stage is
    // simply skipped in the chain.
    let mut current = config
        .output_dir
        .join(format!("merged_max_{}.tif", band));

    for stage in stages {
        let result = match stage {
            Stage::Merge => merge_band(
                &config.input_dir,
                &config.output_dir,
                band,
                config.merge_method,
            )
            .and_then(|path| {
                let mosaic = geotiff::read_raster(&path)?;
                if mosaic.crs != config.src_crs {
                    return Err(PipelineError::CrsMismatch {
                        expected: config.src_crs,
                        found: mosaic.crs,
                    });
                }
                Ok(path)
            }),
            Stage::Reproject => reproject_step(config, &current),
            Stage::Resample => resample_step(config, &current),
            Stage::Stack => unreachable!("stack is not a per-band stage"),
        };

        current = result.map_err(|e| (*stage, e))?;
    }

    Ok(current)
}

fn reproject_step(config: &PipelineConfig, input: &PathBuf) -> Result<PathBuf> {
    let src = geotiff::read_raster(input)?;
    let out = reproject(
        &src,
        config.dst_crs,
        ReprojectOptions {
            resolution: None,
            method: config.interpolation,
        },
    )?;

    let path = with_suffix(input, &crs_suffix(config.dst_crs));
    geotiff::write_raster(&out, &path)?;
    Ok(path)
}

fn resample_step(config: &PipelineConfig, input: &PathBuf) -> Result<PathBuf> {
    let src = geotiff::read_raster(input)?;
    let out = resample_to_crs(
        &src,
        config.resample_crs,
        config.target_resolution,
        config.interpolation,
    )?;

    let path = with_suffix(input, "_resampled");
    geotiff::write_raster(&out, &path)?;
    Ok(path)
}

/// Deterministic per-stage artifact naming: append a suffix to the stem.
fn with_suffix(path: &PathBuf, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{}{}.tif", stem, suffix))
}

/// Filename suffix for a destination CRS.
fn crs_suffix(crs: CrsCode) -> String {
    match crs {
        CrsCode::Epsg4326 => "_wgs84".to_string(),
        other => format!("_{}", other.to_string().to_lowercase().replace(':', "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageToggle;
    use raster_common::CrsCode;
    use test_utils::{raster_from_values, PipelineDirs};

    fn write_tile(dirs: &PipelineDirs, name: &str, values: &[f32], origin_x: f64) {
        let tile = raster_from_values(
            values,
            2,
            2,
            origin_x,
            2_000.0,
            1_000.0,
            CrsCode::Esri102039,
            Some(0.0),
        );
        geotiff::write_raster(&tile, &dirs.tiles.join(name)).unwrap();
    }

    fn test_config(dirs: &PipelineDirs, bands: &[&str], stages: Vec<StageToggle>) -> PipelineConfig {
        PipelineConfig {
            input_dir: dirs.tiles.clone(),
            output_dir: dirs.out.clone(),
            bands: bands.iter().map(|s| s.to_string()).collect(),
            stages,
            target_resolution: 2_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_only_batch() {
        let dirs = PipelineDirs::new();
        write_tile(&dirs, "t1_soc0_150.tif", &[1.0, 2.0, 3.0, 4.0], 0.0);
        write_tile(&dirs, "t2_soc0_150.tif", &[5.0, 1.0, 2.0, 6.0], 0.0);

        let config = test_config(&dirs, &["soc0_150"], vec![StageToggle::on(Stage::Merge)]);
        let report = run(&config).unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.completed.len(), 1);
        assert!(dirs.out.join("merged_max_soc0_150.tif").exists());

        let mosaic = geotiff::read_raster(&dirs.out.join("merged_max_soc0_150.tif")).unwrap();
        assert_eq!(mosaic.data, vec![5.0, 2.0, 3.0, 6.0]);
    }

    #[test]
    fn test_missing_band_does_not_stop_others() {
        let dirs = PipelineDirs::new();
        write_tile(&dirs, "t1_soc0_150.tif", &[1.0, 2.0, 3.0, 4.0], 0.0);
        // No tiles at all for nccpi3all

        let config = test_config(
            &dirs,
            &["nccpi3all", "soc0_150"],
            vec![StageToggle::on(Stage::Merge)],
        );
        let report = run(&config).unwrap();

        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].0, "soc0_150");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].band, "nccpi3all");
        assert_eq!(report.failures[0].stage, Stage::Merge);
    }

    #[test]
    fn test_full_pipeline_produces_stack() {
        let dirs = PipelineDirs::new();
        for band in ["soc0_150", "rootznaws"] {
            write_tile(&dirs, &format!("t1_{}.tif", band), &[1.0, 2.0, 3.0, 4.0], 0.0);
            write_tile(&dirs, &format!("t2_{}.tif", band), &[5.0, 1.0, 2.0, 6.0], 2_000.0);
        }

        let config = test_config(
            &dirs,
            &["soc0_150", "rootznaws"],
            vec![
                StageToggle::on(Stage::Merge),
                StageToggle::on(Stage::Reproject),
                StageToggle::on(Stage::Resample),
                StageToggle::on(Stage::Stack),
            ],
        );
        let report = run(&config).unwrap();

        assert!(report.all_succeeded(), "failures: {:?}", report.failures);
        let stack = report.stack.expect("stack should have been written");
        assert_eq!(stack.shape.0, 2);
        assert!(dirs.out.join("soil_stack.zarr").join("zarr.json").exists());

        // Intermediate artifacts follow the deterministic naming scheme.
        assert!(dirs.out.join("merged_max_soc0_150.tif").exists());
        assert!(dirs.out.join("merged_max_soc0_150_wgs84.tif").exists());
        assert!(dirs.out.join("merged_max_soc0_150_wgs84_resampled.tif").exists());
    }

    #[test]
    fn test_stack_skipped_when_all_bands_fail() {
        let dirs = PipelineDirs::new();

        let config = test_config(
            &dirs,
            &["soc0_150"],
            vec![StageToggle::on(Stage::Merge), StageToggle::on(Stage::Stack)],
        );
        let report = run(&config).unwrap();

        assert_eq!(report.completed.len(), 0);
        assert!(report.stack.is_none());
        assert!(!dirs.out.join("soil_stack.zarr").exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dirs = PipelineDirs::new();
        let config = test_config(&dirs, &[], vec![StageToggle::on(Stage::Merge)]);
        assert!(matches!(run(&config), Err(PipelineError::Config(_))));
    }
}
