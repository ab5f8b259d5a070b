//! Synthetic raster generators for tests.

use raster_common::{CrsCode, GeoTransform, Raster};

/// Build a raster from explicit values with a simple north-up transform.
///
/// The grid spans `width` x `height` pixels of the given size with its
/// top-left corner at (origin_x, origin_y).
pub fn raster_from_values(
    values: &[f32],
    width: usize,
    height: usize,
    origin_x: f64,
    origin_y: f64,
    pixel_size: f64,
    crs: CrsCode,
    nodata: Option<f64>,
) -> Raster {
    assert_eq!(values.len(), width * height, "value count must match shape");
    Raster::new(
        values.to_vec(),
        width,
        height,
        GeoTransform::north_up(origin_x, origin_y, pixel_size, pixel_size),
        crs,
        nodata,
    )
    .expect("generator shape mismatch")
}

/// A ramp raster: value = row * width + col. Every pixel is unique, which
/// makes resampling errors visible.
pub fn ramp_raster(
    width: usize,
    height: usize,
    origin_x: f64,
    origin_y: f64,
    pixel_size: f64,
    crs: CrsCode,
) -> Raster {
    let values: Vec<f32> = (0..width * height).map(|i| i as f32).collect();
    raster_from_values(
        &values, width, height, origin_x, origin_y, pixel_size, crs, None,
    )
}

/// A raster filled with a single value.
pub fn constant_raster(
    value: f32,
    width: usize,
    height: usize,
    origin_x: f64,
    origin_y: f64,
    pixel_size: f64,
    crs: CrsCode,
    nodata: Option<f64>,
) -> Raster {
    raster_from_values(
        &vec![value; width * height],
        width,
        height,
        origin_x,
        origin_y,
        pixel_size,
        crs,
        nodata,
    )
}

/// The three-tile merge scenario: 2x2 tiles at identical extent with
/// nodata 0, whose max-merge is `[[5, 2], [3, 6]]`.
pub fn overlap_merge_tiles() -> Vec<Raster> {
    let mk = |values: &[f32]| {
        let mut r = raster_from_values(
            values,
            2,
            2,
            0.0,
            2.0,
            1.0,
            CrsCode::Esri102039,
            Some(0.0),
        );
        // Loader semantics: sentinel pixels arrive as NaN.
        for v in &mut r.data {
            if *v == 0.0 {
                *v = f32::NAN;
            }
        }
        r
    };

    vec![
        mk(&[1.0, 2.0, 3.0, 4.0]),
        mk(&[5.0, 1.0, 2.0, 6.0]),
        mk(&[0.0, 0.0, 0.0, 0.0]),
    ]
}
