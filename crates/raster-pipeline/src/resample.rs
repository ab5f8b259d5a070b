//! Resolution changes at a fixed (or explicitly chosen) CRS.
//!
//! Same warp mechanics as reprojection, parameterized by a target pixel
//! size instead of a CRS change. The two compose: `resample_to_crs` does
//! both in one transform computation.

use tracing::debug;

use raster_common::{CrsCode, Raster};

use crate::error::Result;
use crate::interpolation::InterpolationMethod;
use crate::reproject::{compute_default_transform, warp};

/// Resample a raster to a new resolution in its own CRS.
///
/// The resolution is expressed in the raster's linear units (meters for
/// projected CRS, degrees for geographic). The output transform's pixel
/// size equals the requested resolution exactly.
pub fn resample(src: &Raster, resolution: f64, method: InterpolationMethod) -> Result<Raster> {
    resample_to_crs(src, src.crs, resolution, method)
}

/// Resample to an explicit resolution in `dst_crs`, reprojecting on the
/// way when `dst_crs` differs from the source CRS.
pub fn resample_to_crs(
    src: &Raster,
    dst_crs: CrsCode,
    resolution: f64,
    method: InterpolationMethod,
) -> Result<Raster> {
    let (transform, width, height) =
        compute_default_transform(src, dst_crs, Some(resolution))?;
    let out = warp(src, dst_crs, transform, width, height, method);

    debug!(
        dst_crs = %dst_crs,
        resolution,
        width, height,
        "resampled raster"
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use test_utils::ramp_raster;

    #[test]
    fn test_coarser_resolution_shrinks_grid() {
        let src = ramp_raster(100, 100, 0.0, 3_000.0, 30.0, CrsCode::Esri102039);

        let out = resample(&src, 125.0, InterpolationMethod::Nearest).unwrap();

        assert_eq!(out.transform.resolution(), (125.0, 125.0));
        assert!(
            out.len() < src.len(),
            "coarser output must have fewer pixels: {} vs {}",
            out.len(),
            src.len()
        );
        assert_eq!(out.crs, src.crs);
    }

    #[test]
    fn test_requested_resolution_is_exact() {
        let src = ramp_raster(64, 64, 0.0, 1_920.0, 30.0, CrsCode::Esri102039);

        for res in [60.0, 90.0, 125.0] {
            let out = resample(&src, res, InterpolationMethod::Nearest).unwrap();
            assert_eq!(out.transform.resolution(), (res, res));
        }
    }

    #[test]
    fn test_same_resolution_preserves_values() {
        let src = ramp_raster(8, 8, 0.0, 240.0, 30.0, CrsCode::Esri102039);

        let out = resample(&src, 30.0, InterpolationMethod::Nearest).unwrap();
        assert_eq!(out.shape(), src.shape());
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn test_nearest_never_blends() {
        let src = ramp_raster(9, 9, 0.0, 9.0, 1.0, CrsCode::Esri102039);

        let out = resample(&src, 2.0, InterpolationMethod::Nearest).unwrap();
        for v in out.data.iter().filter(|v| !v.is_nan()) {
            assert!(src.data.contains(v), "blended value {}", v);
        }
    }

    #[test]
    fn test_resample_with_crs_change() {
        let src = ramp_raster(10, 10, 0.0, 500_000.0, 1_000.0, CrsCode::Esri102039);

        // Combined reprojection + resampling in one transform computation
        let out =
            resample_to_crs(&src, CrsCode::Epsg4326, 0.01, InterpolationMethod::Nearest).unwrap();
        assert_eq!(out.crs, CrsCode::Epsg4326);
        assert_eq!(out.transform.resolution(), (0.01, 0.01));
        assert!(out.valid_count() > 0);
    }

    #[test]
    fn test_zero_resolution_fails() {
        let src = ramp_raster(4, 4, 0.0, 4.0, 1.0, CrsCode::Esri102039);
        assert!(matches!(
            resample(&src, 0.0, InterpolationMethod::Nearest),
            Err(PipelineError::Reprojection(_))
        ));
    }
}
