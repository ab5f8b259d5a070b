//! GeoTIFF reading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use raster_common::{CrsCode, GeoTransform, Raster};

use crate::error::{GeoTiffError, Result};
use crate::tags::*;

/// Georeferencing metadata of a GeoTIFF, without its pixel data.
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    pub nodata: Option<f64>,
}

/// Read only the georeferencing metadata of a GeoTIFF.
pub fn inspect(path: &Path) -> Result<RasterInfo> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    read_info(&mut decoder)
}

/// Read a single-band GeoTIFF into a [`Raster`].
///
/// Pixels equal to the file's nodata sentinel come back as NaN.
pub fn read_raster(path: &Path) -> Result<Raster> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let info = read_info(&mut decoder)?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(GeoTiffError::Unsupported(format!(
                "expected single-band grayscale, got {:?}",
                other
            )))
        }
    }

    let mut data = decode_samples(decoder.read_image()?)?;
    if data.len() != info.width * info.height {
        return Err(GeoTiffError::InvalidData(format!(
            "expected {} samples, decoded {}",
            info.width * info.height,
            data.len()
        )));
    }

    if let Some(nd) = info.nodata {
        let nd32 = nd as f32;
        for v in &mut data {
            if *v == nd32 || (nd.is_nan() && v.is_nan()) {
                *v = f32::NAN;
            }
        }
    }

    Raster::new(
        data,
        info.width,
        info.height,
        info.transform,
        info.crs,
        info.nodata,
    )
    .ok_or_else(|| GeoTiffError::InvalidData("shape/data length mismatch".to_string()))
}

fn read_info<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<RasterInfo> {
    let (width, height) = decoder.dimensions()?;

    if find_f64_vec(decoder, MODEL_TRANSFORMATION)?.is_some() {
        return Err(GeoTiffError::Unsupported(
            "rotated grids (ModelTransformation) are not supported".to_string(),
        ));
    }

    let scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE)?
        .ok_or(GeoTiffError::MissingGeoTag("ModelPixelScale"))?;
    if scale.len() < 2 || scale[0] <= 0.0 || scale[1] <= 0.0 {
        return Err(GeoTiffError::InvalidData(format!(
            "bad pixel scale {:?}",
            scale
        )));
    }

    let tiepoint = find_f64_vec(decoder, MODEL_TIEPOINT)?
        .ok_or(GeoTiffError::MissingGeoTag("ModelTiepoint"))?;
    if tiepoint.len() < 6 {
        return Err(GeoTiffError::InvalidData(format!(
            "bad tiepoint {:?}",
            tiepoint
        )));
    }

    // Tiepoint pins raster point (i, j) to CRS point (x, y); shift back to
    // the top-left corner of pixel (0, 0).
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    let transform = GeoTransform::north_up(origin_x, origin_y, scale[0], scale[1]);

    let keys = find_u16_vec(decoder, GEO_KEY_DIRECTORY)?
        .ok_or(GeoTiffError::MissingGeoTag("GeoKeyDirectory"))?;
    let ascii = find_ascii(decoder, GEO_ASCII_PARAMS)?;
    let crs = parse_crs(&keys, ascii.as_deref())?;

    let nodata = match find_ascii(decoder, GDAL_NODATA)? {
        Some(s) => {
            let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            Some(trimmed.parse::<f64>().map_err(|_| {
                GeoTiffError::InvalidData(format!("unparseable nodata value {:?}", trimmed))
            })?)
        }
        None => None,
    };

    Ok(RasterInfo {
        width: width as usize,
        height: height as usize,
        transform,
        crs,
        nodata,
    })
}

/// Resolve the CRS from a GeoKey directory.
fn parse_crs(keys: &[u16], ascii: Option<&str>) -> Result<CrsCode> {
    if keys.len() < 4 {
        return Err(GeoTiffError::InvalidData(
            "truncated GeoKey directory".to_string(),
        ));
    }

    let num_keys = keys[3] as usize;
    let entries = &keys[4..];
    if entries.len() < num_keys * 4 {
        return Err(GeoTiffError::InvalidData(
            "truncated GeoKey directory".to_string(),
        ));
    }

    let find = |key: u16| -> Option<(u16, u16, u16)> {
        entries
            .chunks_exact(4)
            .take(num_keys)
            .find(|e| e[0] == key)
            .map(|e| (e[1], e[2], e[3]))
    };

    let model_type = find(KEY_GT_MODEL_TYPE)
        .map(|(_, _, v)| v)
        .ok_or(GeoTiffError::MissingGeoTag("GTModelType"))?;

    match model_type {
        MODEL_TYPE_GEOGRAPHIC => {
            let code = find(KEY_GEOGRAPHIC_TYPE)
                .map(|(_, _, v)| v)
                .ok_or(GeoTiffError::MissingGeoTag("GeographicType"))?;
            match code {
                4326 => Ok(CrsCode::Epsg4326),
                other => Err(GeoTiffError::UnsupportedCrs(format!("EPSG:{}", other))),
            }
        }
        MODEL_TYPE_PROJECTED => {
            let code = find(KEY_PROJECTED_CS_TYPE)
                .map(|(_, _, v)| v)
                .ok_or(GeoTiffError::MissingGeoTag("ProjectedCSType"))?;
            match code {
                5070 => Ok(CrsCode::Epsg5070),
                USER_DEFINED => {
                    // User-defined projection, identified by its citation.
                    let (loc, count, offset) = find(KEY_PCS_CITATION)
                        .ok_or(GeoTiffError::MissingGeoTag("PCSCitation"))?;
                    if loc != GEO_ASCII_PARAMS {
                        return Err(GeoTiffError::UnsupportedCrs(
                            "user-defined projection without citation".to_string(),
                        ));
                    }
                    let ascii = ascii.ok_or(GeoTiffError::MissingGeoTag("GeoAsciiParams"))?;
                    let start = offset as usize;
                    let end = (start + count as usize).min(ascii.len());
                    let citation = ascii
                        .get(start..end)
                        .unwrap_or("")
                        .trim_matches(|c: char| c == '|' || c == '\0');
                    CrsCode::parse(citation)
                        .map_err(|_| GeoTiffError::UnsupportedCrs(citation.to_string()))
                }
                other => Err(GeoTiffError::UnsupportedCrs(format!("EPSG:{}", other))),
            }
        }
        other => Err(GeoTiffError::UnsupportedCrs(format!(
            "GeoKey model type {}",
            other
        ))),
    }
}

/// Widen any sample type the decoder hands back to f32.
fn decode_samples(result: DecodingResult) -> Result<Vec<f32>> {
    let data = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
    };
    Ok(data)
}

fn find_f64_vec<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> Result<Option<Vec<f64>>> {
    match decoder.find_tag(Tag::from_u16_exhaustive(tag))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn find_u16_vec<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> Result<Option<Vec<u16>>> {
    match decoder.find_tag(Tag::from_u16_exhaustive(tag))? {
        Some(value) => Ok(Some(value.into_u16_vec()?)),
        None => Ok(None),
    }
}

fn find_ascii<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> Result<Option<String>> {
    match decoder.find_tag(Tag::from_u16_exhaustive(tag))? {
        Some(value) => Ok(Some(value.into_string()?)),
        None => Ok(None),
    }
}
