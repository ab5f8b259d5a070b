//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes handled by the pipeline.
///
/// The soil-survey source data ships in the USGS variant of the CONUS
/// Albers Equal Area projection (ESRI:102039); EPSG:5070 is the same
/// projection registered under NAD83, and EPSG:4326 is the delivery CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 / CONUS Albers Equal Area (meters)
    Epsg5070,
    /// USA Contiguous Albers Equal Area Conic, USGS version (meters)
    Esri102039,
}

impl CrsCode {
    /// Parse an authority:code string, e.g. `"EPSG:4326"` or `"ESRI:102039"`.
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        match s.to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:5070" => Ok(CrsCode::Epsg5070),
            "ESRI:102039" => Ok(CrsCode::Esri102039),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Linear unit of the CRS axes.
    pub fn units(&self) -> &'static str {
        match self {
            CrsCode::Epsg4326 => "degrees",
            CrsCode::Epsg5070 | CrsCode::Esri102039 => "meters",
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg5070 => "EPSG:5070",
            CrsCode::Esri102039 => "ESRI:102039",
        };
        write!(f, "{}", code)
    }
}

impl std::str::FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:5070").unwrap(), CrsCode::Epsg5070);
        assert_eq!(CrsCode::parse("ESRI:102039").unwrap(), CrsCode::Esri102039);
        assert!(CrsCode::parse("EPSG:99999").is_err());
    }

    #[test]
    fn test_geographic_flag() {
        assert!(CrsCode::Epsg4326.is_geographic());
        assert!(!CrsCode::Esri102039.is_geographic());
    }

    #[test]
    fn test_display_roundtrip() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg5070, CrsCode::Esri102039] {
            assert_eq!(CrsCode::parse(&code.to_string()).unwrap(), code);
        }
    }
}
