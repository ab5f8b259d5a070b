//! Tile merging: combine same-CRS tiles into one mosaic by a per-pixel
//! reduction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use raster_common::{GeoTransform, Raster};

use crate::error::{PipelineError, Result};

/// Per-pixel reduction used when tiles overlap.
///
/// The soil layers encode quality indices where the best observation wins,
/// so `Max` is the default. Nodata (NaN) pixels never participate in the
/// reduction; a pixel covered only by nodata stays nodata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Largest valid value wins.
    #[default]
    Max,
    /// Smallest valid value wins.
    Min,
    /// First tile to cover a pixel wins.
    First,
    /// Last tile to cover a pixel wins.
    Last,
}

impl MergeMethod {
    fn combine(&self, current: f32, incoming: f32) -> f32 {
        if incoming.is_nan() {
            return current;
        }
        if current.is_nan() {
            return incoming;
        }
        match self {
            MergeMethod::Max => current.max(incoming),
            MergeMethod::Min => current.min(incoming),
            MergeMethod::First => current,
            MergeMethod::Last => incoming,
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeMethod::Max => write!(f, "max"),
            MergeMethod::Min => write!(f, "min"),
            MergeMethod::First => write!(f, "first"),
            MergeMethod::Last => write!(f, "last"),
        }
    }
}

/// Merge a set of same-CRS tiles into one mosaic.
///
/// The mosaic covers the union of the tile extents at the first tile's
/// resolution; its transform is recomputed from that union. All tiles must
/// share the first tile's CRS and pixel size.
pub fn merge(tiles: &[Raster], method: MergeMethod) -> Result<Raster> {
    let first = tiles
        .first()
        .ok_or_else(|| PipelineError::Input("empty tile set".to_string()))?;

    let (res_x, res_y) = first.resolution();
    for tile in tiles {
        if tile.crs != first.crs {
            return Err(PipelineError::CrsMismatch {
                expected: first.crs,
                found: tile.crs,
            });
        }
        let (rx, ry) = tile.resolution();
        if (rx - res_x).abs() > 1e-6 || (ry - res_y).abs() > 1e-6 {
            return Err(PipelineError::Input(format!(
                "tile resolution ({}, {}) differs from first tile ({}, {})",
                rx, ry, res_x, res_y
            )));
        }
    }

    // Union extent of all tiles defines the mosaic grid.
    let mut bounds = first.bounds();
    for tile in &tiles[1..] {
        bounds = bounds.union(&tile.bounds());
    }

    let width = (bounds.width() / res_x).round().max(1.0) as usize;
    let height = (bounds.height() / res_y).round().max(1.0) as usize;
    let transform = GeoTransform::north_up(bounds.min_x, bounds.max_y, res_x, res_y);

    let mut mosaic = Raster::filled_nan(width, height, transform, first.crs, first.nodata);

    for tile in tiles {
        // Pixel offset of this tile within the mosaic grid. Origins must
        // sit on the mosaic grid; a fractional offset would silently shift
        // the tile by up to half a pixel.
        let col_off_f = (tile.transform.origin_x - transform.origin_x) / res_x;
        let row_off_f = (transform.origin_y - tile.transform.origin_y) / res_y;
        if (col_off_f - col_off_f.round()).abs() > 1e-6
            || (row_off_f - row_off_f.round()).abs() > 1e-6
        {
            return Err(PipelineError::Input(format!(
                "tile origin ({}, {}) is not aligned to the mosaic grid",
                tile.transform.origin_x, tile.transform.origin_y
            )));
        }
        let col_off = col_off_f.round() as i64;
        let row_off = row_off_f.round() as i64;

        for row in 0..tile.height {
            let out_row = row_off + row as i64;
            if out_row < 0 || out_row >= height as i64 {
                continue;
            }
            for col in 0..tile.width {
                let out_col = col_off + col as i64;
                if out_col < 0 || out_col >= width as i64 {
                    continue;
                }
                let idx = out_row as usize * width + out_col as usize;
                let incoming = tile.data[row * tile.width + col];
                mosaic.data[idx] = method.combine(mosaic.data[idx], incoming);
            }
        }
    }

    debug!(
        tiles = tiles.len(),
        width, height, %method,
        "merged tile set"
    );

    Ok(mosaic)
}

/// Discover the tiles for one band under `input_dir`.
///
/// Tiles follow the `<tile_id>_<band>.tif` convention; matches are sorted
/// for deterministic merge order.
pub fn discover_tiles(input_dir: &Path, band: &str) -> Vec<PathBuf> {
    let suffixes = [format!("_{}.tif", band), format!("_{}.tiff", band)];

    let mut paths: Vec<PathBuf> = WalkDir::new(input_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| suffixes.iter().any(|s| name.ends_with(s.as_str())))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    paths.sort();
    paths
}

/// Merge all tiles for one band and write the mosaic.
///
/// Output path is `<output_dir>/merged_max_<band>.tif` (the deterministic
/// name downstream stages look for). The write happens only after the full
/// merge has succeeded.
pub fn merge_band(
    input_dir: &Path,
    output_dir: &Path,
    band: &str,
    method: MergeMethod,
) -> Result<PathBuf> {
    let paths = discover_tiles(input_dir, band);
    if paths.is_empty() {
        return Err(PipelineError::Input(format!(
            "no tiles matching *_{}.tif under {}",
            band,
            input_dir.display()
        )));
    }

    let mut tiles = Vec::with_capacity(paths.len());
    for path in &paths {
        let tile = geotiff::read_raster(path).map_err(|e| {
            PipelineError::Input(format!("cannot open {}: {}", path.display(), e))
        })?;
        tiles.push(tile);
    }

    let mosaic = merge(&tiles, method)?;

    std::fs::create_dir_all(output_dir)?;
    let out_path = output_dir.join(format!("merged_max_{}.tif", band));
    geotiff::write_raster(&mosaic, &out_path)?;

    info!(
        band,
        tiles = paths.len(),
        output = %out_path.display(),
        "merged band"
    );

    Ok(out_path)
}
