//! GeoTIFF writing.

use std::path::Path;

use tempfile::NamedTempFile;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use raster_common::{CrsCode, Raster};

use crate::error::{GeoTiffError, Result};
use crate::tags::*;

/// Write a raster as a single-band float32 GeoTIFF.
///
/// The file is written to a temporary sibling and renamed into place once
/// the encode has fully succeeded, so a failure never leaves a partial
/// output behind. NaN pixels are written as the raster's nodata sentinel
/// when one is set.
pub fn write_raster(raster: &Raster, path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;

    encode(raster, tmp.as_file_mut())?;

    tmp.persist(path)
        .map_err(|e| GeoTiffError::Io(e.error))?;

    debug!(path = %path.display(), width = raster.width, height = raster.height, "wrote geotiff");
    Ok(())
}

fn encode(raster: &Raster, file: &mut std::fs::File) -> Result<()> {
    let mut encoder = TiffEncoder::new(file)?;
    let mut image =
        encoder.new_image::<colortype::Gray32Float>(raster.width as u32, raster.height as u32)?;

    let (sx, sy) = raster.transform.resolution();
    let tiepoint = [
        0.0,
        0.0,
        0.0,
        raster.transform.origin_x,
        raster.transform.origin_y,
        0.0,
    ];

    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[sx, sy, 0.0][..])?;
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;

    let (keys, ascii) = geo_keys(raster.crs);
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &keys[..])?;
    if let Some(ascii) = ascii {
        image
            .encoder()
            .write_tag(Tag::Unknown(GEO_ASCII_PARAMS), ascii)?;
    }

    if let Some(nd) = raster.nodata {
        image
            .encoder()
            .write_tag(Tag::Unknown(GDAL_NODATA), format_nodata(nd).as_str())?;
    }

    match raster.nodata {
        Some(nd) => {
            let nd32 = nd as f32;
            let buf: Vec<f32> = raster
                .data
                .iter()
                .map(|&v| if v.is_nan() { nd32 } else { v })
                .collect();
            image.write_data(&buf)?;
        }
        None => {
            image.write_data(&raster.data)?;
        }
    }

    Ok(())
}

/// GeoKey directory (and ASCII params, when needed) for a CRS.
fn geo_keys(crs: CrsCode) -> (Vec<u16>, Option<&'static str>) {
    let (entries, ascii): (Vec<[u16; 4]>, Option<&'static str>) = match crs {
        CrsCode::Epsg4326 => (
            vec![
                [KEY_GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC],
                [KEY_GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
                [KEY_GEOGRAPHIC_TYPE, 0, 1, 4326],
            ],
            None,
        ),
        CrsCode::Epsg5070 => (
            vec![
                [KEY_GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED],
                [KEY_GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
                [KEY_PROJECTED_CS_TYPE, 0, 1, 5070],
            ],
            None,
        ),
        // ESRI codes exceed the 16-bit GeoKey range, so the projection is
        // written user-defined with the authority code in the citation.
        CrsCode::Esri102039 => {
            let ascii = "ESRI:102039|";
            (
                vec![
                    [KEY_GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED],
                    [KEY_GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
                    [KEY_PROJECTED_CS_TYPE, 0, 1, USER_DEFINED],
                    [KEY_PCS_CITATION, GEO_ASCII_PARAMS, ascii.len() as u16, 0],
                ],
                Some(ascii),
            )
        }
    };

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    for e in &entries {
        keys.extend_from_slice(e);
    }
    (keys, ascii)
}

/// GDAL stores nodata as ASCII; keep integral sentinels free of a trailing
/// ".0" the way GDAL writes them.
fn format_nodata(nd: f64) -> String {
    if nd.fract() == 0.0 && nd.abs() < 1e15 {
        format!("{}", nd as i64)
    } else {
        format!("{}", nd)
    }
}
