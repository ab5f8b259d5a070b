//! GeoTIFF tag and GeoKey constants.
//!
//! The `tiff` crate only knows baseline TIFF tags, so the GeoTIFF
//! extension tags are addressed as `Tag::Unknown(..)` with the constants
//! below.

/// ModelPixelScaleTag: [scale_x, scale_y, scale_z] in CRS units per pixel.
pub const MODEL_PIXEL_SCALE: u16 = 33550;

/// ModelTiepointTag: [i, j, k, x, y, z] tying raster point (i, j) to CRS
/// point (x, y).
pub const MODEL_TIEPOINT: u16 = 33922;

/// ModelTransformationTag: full 4x4 affine. Present on rotated grids,
/// which this reader rejects.
pub const MODEL_TRANSFORMATION: u16 = 34264;

/// GeoKeyDirectoryTag: SHORT array of GeoKey entries.
pub const GEO_KEY_DIRECTORY: u16 = 34735;

/// GeoAsciiParamsTag: ASCII storage for text-valued GeoKeys.
pub const GEO_ASCII_PARAMS: u16 = 34737;

/// GDAL's nodata sentinel, stored as ASCII.
pub const GDAL_NODATA: u16 = 42113;

// GeoKey IDs used by this crate.

/// Model type: 1 = projected, 2 = geographic.
pub const KEY_GT_MODEL_TYPE: u16 = 1024;

/// Raster space: 1 = PixelIsArea.
pub const KEY_GT_RASTER_TYPE: u16 = 1025;

/// Geographic CRS code (e.g. 4326).
pub const KEY_GEOGRAPHIC_TYPE: u16 = 2048;

/// Projected CRS code, or 32767 for user-defined.
pub const KEY_PROJECTED_CS_TYPE: u16 = 3072;

/// Citation for user-defined projected CRS.
pub const KEY_PCS_CITATION: u16 = 3073;

pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
pub const RASTER_PIXEL_IS_AREA: u16 = 1;
pub const USER_DEFINED: u16 = 32767;
