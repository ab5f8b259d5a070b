//! Soil raster pipeline runner.
//!
//! Merges per-tile soil GeoTIFFs into band mosaics, reprojects and
//! resamples them, and stacks the bands into a single Zarr artifact.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use raster_pipeline::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Soil raster merge/reproject/resample/stack pipeline")]
struct Args {
    /// Configuration file path (YAML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input tile directory (overrides config)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Restrict the run to specific bands (repeatable)
    #[arg(short, long)]
    band: Vec<String>,

    /// Print georeferencing for a GeoTIFF and exit
    #[arg(long)]
    inspect: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    dump_config: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &args.inspect {
        return inspect_file(path);
    }

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = args.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if !args.band.is_empty() {
        config.bands = args.band;
    }

    if args.dump_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        bands = config.bands.len(),
        "starting soil raster pipeline"
    );

    let report = raster_pipeline::run(&config)?;

    for failure in &report.failures {
        warn!(
            band = %failure.band,
            stage = %failure.stage,
            error = %failure.error,
            "band failed"
        );
    }
    if let Some(stack) = &report.stack {
        info!(
            path = %stack.path.display(),
            shape = ?stack.shape,
            "stack written"
        );
    }

    if report.completed.is_empty() {
        bail!("no band completed the pipeline");
    }

    info!(
        completed = report.completed.len(),
        failed = report.failures.len(),
        "pipeline finished"
    );

    Ok(())
}

/// Print georeferencing for a single file.
fn inspect_file(path: &PathBuf) -> Result<()> {
    let info = geotiff::inspect(path)?;

    println!("file:       {}", path.display());
    println!("size:       {} x {}", info.width, info.height);
    println!("crs:        {}", info.crs);
    println!(
        "origin:     ({}, {})",
        info.transform.origin_x, info.transform.origin_y
    );
    println!(
        "pixel size: ({}, {})",
        info.transform.pixel_width, info.transform.pixel_height
    );
    match info.nodata {
        Some(v) => println!("nodata:     {}", v),
        None => println!("nodata:     none"),
    }

    Ok(())
}
