//! Raster reprojection between coordinate reference systems.
//!
//! The destination grid is computed first (transform + dimensions covering
//! the reprojected source extent), then every destination pixel center is
//! inverse-mapped into the source grid and sampled.

use tracing::debug;

use raster_common::{BoundingBox, CrsCode, GeoTransform, Raster};

use crate::error::{PipelineError, Result};
use crate::interpolation::{sample, InterpolationMethod};

/// Options for a reprojection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReprojectOptions {
    /// Output pixel size in destination CRS units. When `None`, the
    /// source's effective resolution is carried over.
    pub resolution: Option<f64>,
    /// Resampling rule; nearest neighbor by default.
    pub method: InterpolationMethod,
}

/// Compute the destination transform and dimensions for a reprojection.
///
/// The output grid exactly covers the reprojected extent of the source:
/// its bounding box is taken from the source edges transformed into the
/// destination CRS, and its resolution either matches the source's
/// effective resolution or the explicit override.
pub fn compute_default_transform(
    src: &Raster,
    dst_crs: CrsCode,
    resolution: Option<f64>,
) -> Result<(GeoTransform, usize, usize)> {
    let bounds = transform_bounds(src, dst_crs)?;

    let res = match resolution {
        Some(r) => {
            if !(r.is_finite() && r > 0.0) {
                return Err(PipelineError::Reprojection(format!(
                    "invalid target resolution {}",
                    r
                )));
            }
            r
        }
        // Effective source resolution: spread the source pixel count over
        // the reprojected extent, square pixels.
        None => (bounds.width() / src.width as f64).max(bounds.height() / src.height as f64),
    };

    let width = (bounds.width() / res).ceil().max(1.0) as usize;
    let height = (bounds.height() / res).ceil().max(1.0) as usize;
    let transform = GeoTransform::north_up(bounds.min_x, bounds.max_y, res, res);

    Ok((transform, width, height))
}

/// Reproject a raster into `dst_crs`.
///
/// Nearest-neighbor resampling picks the source pixel whose center is
/// closest to each destination pixel center under the coordinate mapping;
/// destination pixels outside the source coverage become NaN.
pub fn reproject(src: &Raster, dst_crs: CrsCode, opts: ReprojectOptions) -> Result<Raster> {
    let (transform, width, height) = compute_default_transform(src, dst_crs, opts.resolution)?;
    let out = warp(src, dst_crs, transform, width, height, opts.method);

    debug!(
        src_crs = %src.crs,
        dst_crs = %dst_crs,
        width, height,
        method = %opts.method,
        "reprojected raster"
    );

    Ok(out)
}

/// Sample the source onto an already-computed destination grid.
///
/// Shared by reprojection and resampling; the two differ only in how the
/// destination grid was derived.
pub(crate) fn warp(
    src: &Raster,
    dst_crs: CrsCode,
    dst_transform: GeoTransform,
    width: usize,
    height: usize,
    method: InterpolationMethod,
) -> Raster {
    let mut out = Raster::filled_nan(width, height, dst_transform, dst_crs, src.nodata);

    for out_row in 0..height {
        for out_col in 0..width {
            let (dst_x, dst_y) = dst_transform.pixel_to_coords(out_col as f64, out_row as f64);

            // Map the destination pixel center back into the source CRS;
            // points outside the projection domain stay NaN.
            let (src_x, src_y) = match projection::transform_point(dst_crs, src.crs, dst_x, dst_y)
            {
                Ok(p) => p,
                Err(_) => continue,
            };

            let (col, row) = src.transform.coords_to_pixel(src_x, src_y);
            out.data[out_row * width + out_col] =
                sample(&src.data, src.width, src.height, col, row, method);
        }
    }

    out
}

/// Reprojected bounding box of the source, from densified edge sampling.
fn transform_bounds(src: &Raster, dst_crs: CrsCode) -> Result<BoundingBox> {
    if src.is_empty() {
        return Err(PipelineError::Reprojection("empty source raster".to_string()));
    }

    let src_bounds = src.bounds();
    if !src_bounds.is_valid() {
        return Err(PipelineError::Reprojection(format!(
            "degenerate source bounds {:?}",
            src_bounds
        )));
    }

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    let mut mapped = 0usize;

    // Walk all four edges; conic projections bow the edges, so corners
    // alone under-cover.
    const STEPS: usize = 20;
    for t in 0..=STEPS {
        let frac = t as f64 / STEPS as f64;
        let x = src_bounds.min_x + frac * src_bounds.width();
        let y = src_bounds.min_y + frac * src_bounds.height();

        let edge_points = [
            (x, src_bounds.min_y),
            (x, src_bounds.max_y),
            (src_bounds.min_x, y),
            (src_bounds.max_x, y),
        ];

        for (px, py) in edge_points {
            if let Ok((tx, ty)) = projection::transform_point(src.crs, dst_crs, px, py) {
                min_x = min_x.min(tx);
                min_y = min_y.min(ty);
                max_x = max_x.max(tx);
                max_y = max_y.max(ty);
                mapped += 1;
            }
        }
    }

    if mapped == 0 {
        return Err(PipelineError::Reprojection(format!(
            "no part of the source extent maps from {} to {}",
            src.crs, dst_crs
        )));
    }

    let bounds = BoundingBox::new(min_x, min_y, max_x, max_y);
    if !bounds.is_valid() {
        return Err(PipelineError::Reprojection(format!(
            "degenerate destination bounds {:?}",
            bounds
        )));
    }

    Ok(bounds)
}
