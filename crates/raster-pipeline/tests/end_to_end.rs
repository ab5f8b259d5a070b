//! End-to-end pipeline tests over real files on disk.

use raster_common::CrsCode;
use raster_pipeline::{
    reproject, resample, InterpolationMethod, MergeMethod, PipelineConfig, ReprojectOptions,
    Stage, StageToggle,
};
use test_utils::{assert_approx_eq, ramp_raster, raster_from_values, PipelineDirs};

fn write_tile(dirs: &PipelineDirs, name: &str, values: &[f32], origin_x: f64, origin_y: f64) {
    let tile = raster_from_values(
        values,
        2,
        2,
        origin_x,
        origin_y,
        1_000.0,
        CrsCode::Esri102039,
        Some(0.0),
    );
    geotiff::write_raster(&tile, &dirs.tiles.join(name)).unwrap();
}

#[test]
fn merge_overlapping_tiles_from_disk() {
    let dirs = PipelineDirs::new();

    // Overlapping extent, nodata 0: max-merge is [[5,2],[3,6]]
    write_tile(&dirs, "a_nccpi3all.tif", &[1.0, 2.0, 3.0, 4.0], 0.0, 2_000.0);
    write_tile(&dirs, "b_nccpi3all.tif", &[5.0, 1.0, 2.0, 6.0], 0.0, 2_000.0);
    write_tile(&dirs, "c_nccpi3all.tif", &[0.0, 0.0, 0.0, 0.0], 0.0, 2_000.0);
    // A different band must not leak into the merge set
    write_tile(&dirs, "a_nccpi3corn.tif", &[9.0, 9.0, 9.0, 9.0], 0.0, 2_000.0);

    let out = raster_pipeline::merge_band(
        &dirs.tiles,
        &dirs.out,
        "nccpi3all",
        MergeMethod::Max,
    )
    .unwrap();

    let mosaic = geotiff::read_raster(&out).unwrap();
    assert_eq!(mosaic.shape(), (2, 2));
    assert_eq!(mosaic.data, vec![5.0, 2.0, 3.0, 6.0]);
    assert_eq!(mosaic.crs, CrsCode::Esri102039);
}

#[test]
fn reproject_then_resample_roundtrips_through_disk() {
    let dirs = PipelineDirs::new();

    let src = ramp_raster(20, 20, -50_000.0, 850_000.0, 1_000.0, CrsCode::Esri102039);
    let src_path = dirs.out.join("src.tif");
    geotiff::write_raster(&src, &src_path).unwrap();

    let loaded = geotiff::read_raster(&src_path).unwrap();
    let wgs84 = reproject(&loaded, CrsCode::Epsg4326, ReprojectOptions::default()).unwrap();
    assert_eq!(wgs84.crs, CrsCode::Epsg4326);

    let wgs84_path = dirs.out.join("src_wgs84.tif");
    geotiff::write_raster(&wgs84, &wgs84_path).unwrap();

    let reloaded = geotiff::read_raster(&wgs84_path).unwrap();
    assert_eq!(reloaded.crs, CrsCode::Epsg4326);
    assert_approx_eq!(
        reloaded.transform.origin_x,
        wgs84.transform.origin_x,
        1e-9
    );

    let resampled = raster_pipeline::resample_to_crs(
        &reloaded,
        CrsCode::Esri102039,
        2_000.0,
        InterpolationMethod::Nearest,
    )
    .unwrap();
    assert_eq!(resampled.crs, CrsCode::Esri102039);
    assert_eq!(resampled.transform.resolution(), (2_000.0, 2_000.0));

    // Nearest neighbor through the whole chain never invents values
    for v in resampled.data.iter().filter(|v| !v.is_nan()) {
        assert!(src.data.contains(v), "value {} not in source", v);
    }
}

#[test]
fn resample_alone_keeps_crs() {
    let src = ramp_raster(16, 16, 0.0, 16_000.0, 1_000.0, CrsCode::Esri102039);
    let out = resample(&src, 4_000.0, InterpolationMethod::Nearest).unwrap();
    assert_eq!(out.crs, src.crs);
    assert_eq!(out.shape(), (4, 4));
}

#[test]
fn batch_run_writes_stack_with_band_order() {
    let dirs = PipelineDirs::new();
    for band in ["soc0_150", "rootznaws", "pctearthmc"] {
        write_tile(
            &dirs,
            &format!("t1_{}.tif", band),
            &[1.0, 2.0, 3.0, 4.0],
            0.0,
            2_000.0,
        );
    }

    let config = PipelineConfig {
        input_dir: dirs.tiles.clone(),
        output_dir: dirs.out.clone(),
        bands: ["soc0_150", "rootznaws", "pctearthmc"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        stages: vec![StageToggle::on(Stage::Merge), StageToggle::on(Stage::Stack)],
        ..Default::default()
    };

    let report = raster_pipeline::run(&config).unwrap();
    assert!(report.all_succeeded(), "failures: {:?}", report.failures);

    let stack = report.stack.expect("stack missing");
    assert_eq!(stack.shape, (3, 2, 2));

    // Attributes record the band order the array was written in.
    let meta = std::fs::read_to_string(stack.path.join("zarr.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&meta).unwrap();
    let names: Vec<&str> = json["attributes"]["band_names"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["soc0_150", "rootznaws", "pctearthmc"]);
}
