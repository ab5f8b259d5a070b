//! Band stacking: combine single-band rasters into one multi-band Zarr
//! artifact.
//!
//! All inputs are loaded and validated before anything touches the
//! filesystem, so a mismatched band never leaves a partial store behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use raster_common::Raster;

use crate::config::{ZarrCompression, ZarrConfig};
use crate::error::{PipelineError, Result};

/// Summary of a written stack.
#[derive(Debug)]
pub struct StackSummary {
    /// Path of the Zarr store.
    pub path: PathBuf,
    /// Array shape as (bands, height, width).
    pub shape: (usize, usize, usize),
    /// Uncompressed payload size.
    pub bytes_written: u64,
}

/// Stack one raster per band into a `[bands, height, width]` Zarr array.
///
/// Every input must match the first band's grid exactly (shape, transform,
/// CRS); the first mismatch aborts the stack before any output exists.
/// Band order in the array follows the input order.
pub fn stack_bands(inputs: &[(String, PathBuf)], output: &Path, zarr: &ZarrConfig) -> Result<StackSummary> {
    if inputs.is_empty() {
        return Err(PipelineError::Input("no bands to stack".to_string()));
    }

    let mut rasters: Vec<Raster> = Vec::with_capacity(inputs.len());
    for (band, path) in inputs {
        let raster = geotiff::read_raster(path).map_err(|e| {
            PipelineError::Input(format!("cannot open band {} ({}): {}", band, path.display(), e))
        })?;
        debug!(band, shape = ?raster.shape(), "loaded band for stacking");
        rasters.push(raster);
    }

    validate_aligned(inputs, &rasters)?;

    let first = &rasters[0];
    let (width, height) = first.shape();
    let bands = rasters.len();

    // Flatten into [bands, height, width] row-major.
    let mut data = Vec::with_capacity(bands * height * width);
    for raster in &rasters {
        data.extend_from_slice(&raster.data);
    }

    write_zarr(inputs, first, &data, output, zarr)?;

    let summary = StackSummary {
        path: output.to_path_buf(),
        shape: (bands, height, width),
        bytes_written: (data.len() * std::mem::size_of::<f32>()) as u64,
    };

    info!(
        bands,
        width,
        height,
        output = %output.display(),
        compression = %zarr.compression,
        "stacked bands"
    );

    Ok(summary)
}

/// Check that every band shares the first band's grid.
fn validate_aligned(inputs: &[(String, PathBuf)], rasters: &[Raster]) -> Result<()> {
    let first = &rasters[0];

    for ((band, path), raster) in inputs.iter().zip(rasters).skip(1) {
        if raster.crs != first.crs {
            return Err(PipelineError::CrsMismatch {
                expected: first.crs,
                found: raster.crs,
            });
        }
        if raster.shape() != first.shape() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{:?}", first.shape()),
                found: format!("{:?}", raster.shape()),
                input: format!("{} ({})", band, path.display()),
            });
        }
        if !raster.transform.approx_eq(&first.transform, 1e-6) {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{:?}", first.transform),
                found: format!("{:?}", raster.transform),
                input: format!("{} ({})", band, path.display()),
            });
        }
    }

    Ok(())
}

/// Write the validated stack to a fresh Zarr V3 store.
///
/// The store is built in a staging sibling and renamed into place once
/// every chunk has been written, mirroring the GeoTIFF writer: a storage
/// failure mid-write leaves the previous artifact untouched and no
/// partial store behind.
fn write_zarr(
    inputs: &[(String, PathBuf)],
    first: &Raster,
    data: &[f32],
    output: &Path,
    zarr: &ZarrConfig,
) -> Result<()> {
    let staging = staging_path(output)?;
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    if let Err(e) = build_store(inputs, first, data, &staging, zarr) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    // Replace the previous artifact only after the full store exists.
    if output.exists() {
        std::fs::remove_dir_all(output)?;
    }
    std::fs::rename(&staging, output)?;

    Ok(())
}

/// Staging directory next to the final artifact.
fn staging_path(output: &Path) -> Result<PathBuf> {
    let name = output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::Storage(format!("bad stack path {}", output.display())))?;
    Ok(output.with_file_name(format!("{}.partial", name)))
}

fn build_store(
    inputs: &[(String, PathBuf)],
    first: &Raster,
    data: &[f32],
    staging: &Path,
    zarr: &ZarrConfig,
) -> Result<()> {
    let (width, height) = first.shape();
    let bands = inputs.len();

    let store = Arc::new(
        FilesystemStore::new(staging).map_err(|e| PipelineError::Storage(e.to_string()))?,
    );

    let band_names: Vec<&str> = inputs.iter().map(|(band, _)| band.as_str()).collect();
    let bounds = first.bounds();
    let t = &first.transform;

    let mut attrs = serde_json::Map::new();
    attrs.insert("band_names".to_string(), serde_json::json!(band_names));
    attrs.insert("crs".to_string(), serde_json::json!(first.crs.to_string()));
    attrs.insert(
        "transform".to_string(),
        serde_json::json!([t.origin_x, t.origin_y, t.pixel_width, t.pixel_height]),
    );
    attrs.insert(
        "bbox".to_string(),
        serde_json::json!([bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y]),
    );
    attrs.insert(
        "created".to_string(),
        serde_json::json!(Utc::now().to_rfc3339()),
    );

    // One band per chunk keeps per-band reads cheap.
    let chunk = zarr.chunk_size as u64;
    let chunk_grid: zarrs::array::ChunkGrid = vec![1, chunk, chunk]
        .try_into()
        .map_err(|e| PipelineError::Config(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(
        vec![bands as u64, height as u64, width as u64],
        DataType::Float32,
        chunk_grid,
        FillValue::from(f32::NAN),
    );
    let mut builder = binding
        .attributes(attrs)
        .dimension_names(["band", "y", "x"].into());

    if zarr.compression != ZarrCompression::None {
        builder = builder.bytes_to_bytes_codecs(vec![compression_codec(zarr)?]);
    }

    let array = builder
        .build(store, "/")
        .map_err(|e| PipelineError::Storage(e.to_string()))?;

    array
        .store_metadata()
        .map_err(|e| PipelineError::Storage(e.to_string()))?;

    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0, 0],
        vec![bands as u64, height as u64, width as u64],
    )
    .map_err(|e| PipelineError::Storage(e.to_string()))?;

    array
        .store_array_subset_elements(&subset, data)
        .map_err(|e| PipelineError::Storage(e.to_string()))?;

    Ok(())
}

/// Build the Blosc codec for the configured compression.
fn compression_codec(
    zarr: &ZarrConfig,
) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(zarr.compression_level)
        .map_err(|_| PipelineError::Config("invalid compression level".to_string()))?;

    let shuffle = if zarr.shuffle {
        BloscShuffleMode::Shuffle
    } else {
        BloscShuffleMode::NoShuffle
    };

    // typesize is required when shuffle is enabled
    let typesize = if zarr.shuffle { Some(4) } else { None };

    let compressor = match zarr.compression {
        ZarrCompression::None => {
            return Err(PipelineError::Config("no compression configured".to_string()))
        }
        ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
        ZarrCompression::BloscZstd => BloscCompressor::Zstd,
    };

    let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
        .map_err(|e| PipelineError::Config(e.to_string()))?;

    Ok(Arc::new(codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::CrsCode;
    use test_utils::{constant_raster, raster_from_values};

    fn write_band(dir: &Path, name: &str, raster: &Raster) -> (String, PathBuf) {
        let path = dir.join(format!("{}.tif", name));
        geotiff::write_raster(raster, &path).unwrap();
        (name.to_string(), path)
    }

    #[test]
    fn test_stack_two_bands() {
        let dir = tempfile::tempdir().unwrap();

        let a = raster_from_values(
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            3,
            2,
            0.0,
            2.0,
            1.0,
            CrsCode::Epsg4326,
            None,
        );
        let b = raster_from_values(
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            3,
            2,
            0.0,
            2.0,
            1.0,
            CrsCode::Epsg4326,
            None,
        );

        let inputs = vec![
            write_band(dir.path(), "soc0_150", &a),
            write_band(dir.path(), "rootznaws", &b),
        ];

        let out = dir.path().join("stack.zarr");
        let summary = stack_bands(&inputs, &out, &ZarrConfig::default()).unwrap();

        assert_eq!(summary.shape, (2, 2, 3));
        assert!(out.join("zarr.json").exists());
    }

    #[test]
    fn test_shape_mismatch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let a = constant_raster(1.0, 4, 4, 0.0, 4.0, 1.0, CrsCode::Epsg4326, None);
        let b = constant_raster(2.0, 3, 3, 0.0, 3.0, 1.0, CrsCode::Epsg4326, None);

        let inputs = vec![
            write_band(dir.path(), "band_a", &a),
            write_band(dir.path(), "band_b", &b),
        ];

        let out = dir.path().join("stack.zarr");
        let err = stack_bands(&inputs, &out, &ZarrConfig::default()).unwrap_err();

        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
        assert!(!out.exists(), "failed stack must not leave output behind");
    }

    #[test]
    fn test_transform_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();

        // Same shape, shifted origin
        let a = constant_raster(1.0, 4, 4, 0.0, 4.0, 1.0, CrsCode::Epsg4326, None);
        let b = constant_raster(2.0, 4, 4, 100.0, 104.0, 1.0, CrsCode::Epsg4326, None);

        let inputs = vec![
            write_band(dir.path(), "band_a", &a),
            write_band(dir.path(), "band_b", &b),
        ];

        let out = dir.path().join("stack.zarr");
        assert!(matches!(
            stack_bands(&inputs, &out, &ZarrConfig::default()),
            Err(PipelineError::ShapeMismatch { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_failed_restack_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();

        let a = constant_raster(1.0, 4, 4, 0.0, 4.0, 1.0, CrsCode::Epsg4326, None);
        let good = vec![write_band(dir.path(), "soc0_150", &a)];

        let out = dir.path().join("stack.zarr");
        stack_bands(&good, &out, &ZarrConfig::default()).unwrap();
        let before = std::fs::read_to_string(out.join("zarr.json")).unwrap();

        // A later run with a misaligned band must not disturb the store.
        let b = constant_raster(2.0, 3, 3, 0.0, 3.0, 1.0, CrsCode::Epsg4326, None);
        let bad = vec![
            write_band(dir.path(), "soc0_150", &a),
            write_band(dir.path(), "rootznaws", &b),
        ];
        assert!(stack_bands(&bad, &out, &ZarrConfig::default()).is_err());

        let after = std::fs::read_to_string(out.join("zarr.json")).unwrap();
        assert_eq!(before, after);
        assert!(
            !dir.path().join("stack.zarr.partial").exists(),
            "staging directory must not survive"
        );
    }

    #[test]
    fn test_successful_stack_leaves_no_staging() {
        let dir = tempfile::tempdir().unwrap();

        let a = constant_raster(1.0, 4, 4, 0.0, 4.0, 1.0, CrsCode::Epsg4326, None);
        let inputs = vec![write_band(dir.path(), "only", &a)];

        let out = dir.path().join("stack.zarr");
        stack_bands(&inputs, &out, &ZarrConfig::default()).unwrap();

        assert!(out.join("zarr.json").exists());
        assert!(!dir.path().join("stack.zarr.partial").exists());
    }

    #[test]
    fn test_dimension_names_recorded() {
        let dir = tempfile::tempdir().unwrap();

        let a = constant_raster(1.0, 4, 4, 0.0, 4.0, 1.0, CrsCode::Epsg4326, None);
        let inputs = vec![write_band(dir.path(), "only", &a)];

        let out = dir.path().join("stack.zarr");
        stack_bands(&inputs, &out, &ZarrConfig::default()).unwrap();

        let meta = std::fs::read_to_string(out.join("zarr.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&meta).unwrap();
        let dims: Vec<&str> = json["dimension_names"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(dims, vec!["band", "y", "x"]);
    }

    #[test]
    fn test_empty_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stack.zarr");
        assert!(matches!(
            stack_bands(&[], &out, &ZarrConfig::default()),
            Err(PipelineError::Input(_))
        ));
    }

    #[test]
    fn test_stack_preserves_band_order() {
        let dir = tempfile::tempdir().unwrap();

        let a_values: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let b_values: Vec<f32> = (0..9).map(|i| (100 + i) as f32).collect();
        let a = raster_from_values(&a_values, 3, 3, 0.0, 3.0, 1.0, CrsCode::Epsg4326, None);
        let b = raster_from_values(&b_values, 3, 3, 0.0, 3.0, 1.0, CrsCode::Epsg4326, None);

        let inputs = vec![
            write_band(dir.path(), "first", &a),
            write_band(dir.path(), "second", &b),
        ];

        let out = dir.path().join("stack.zarr");
        let summary = stack_bands(&inputs, &out, &ZarrConfig::default()).unwrap();
        assert_eq!(summary.shape, (2, 3, 3));

        let store = Arc::new(FilesystemStore::new(&out).unwrap());
        let array = zarrs::array::Array::open(store, "/").unwrap();
        let subset =
            ArraySubset::new_with_start_shape(vec![0, 0, 0], vec![2, 3, 3]).unwrap();
        let read: Vec<f32> = array.retrieve_array_subset_elements(&subset).unwrap();

        assert_eq!(&read[..9], &a_values[..]);
        assert_eq!(&read[9..], &b_values[..]);
    }

    #[test]
    fn test_stack_without_compression() {
        let dir = tempfile::tempdir().unwrap();

        let a = constant_raster(3.5, 8, 8, 0.0, 8.0, 1.0, CrsCode::Epsg4326, None);
        let inputs = vec![write_band(dir.path(), "only", &a)];

        let zarr = ZarrConfig {
            compression: ZarrCompression::None,
            ..Default::default()
        };
        let out = dir.path().join("stack.zarr");
        let summary = stack_bands(&inputs, &out, &zarr).unwrap();
        assert_eq!(summary.shape, (1, 8, 8));
    }
}
