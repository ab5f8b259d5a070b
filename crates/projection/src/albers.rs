//! Albers Equal Area Conic projection.
//!
//! The soil-survey rasters ship in the USA Contiguous Albers Equal Area
//! Conic projection (ESRI:102039, parameter-identical to EPSG:5070). The
//! projection maps a secant cone onto the plane while preserving area.
//!
//! Parameters:
//! - Latitude of origin (lat0) and central meridian (lon0)
//! - Two standard parallels where the cone intersects the sphere
//! - False easting/northing (zero for the CONUS variant)

use std::f64::consts::PI;

/// Albers Equal Area Conic projection on a spherical earth.
///
/// Precomputes the cone constant `n`, the `c` constant, and `rho0` at
/// construction so forward/inverse are a handful of trig calls.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub sp1: f64,
    /// Second standard parallel in radians
    pub sp2: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// Cone constant
    n: f64,
    /// C constant
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a projection from parameters in degrees.
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        sp1_deg: f64,
        sp2_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let to_rad = PI / 180.0;

        let lat0 = lat0_deg * to_rad;
        let lon0 = lon0_deg * to_rad;
        let sp1 = sp1_deg * to_rad;
        let sp2 = sp2_deg * to_rad;

        // Spherical earth radius in meters
        let earth_radius = 6371229.0;

        // Cone constant
        let n = if (sp1 - sp2).abs() < 1e-10 {
            sp1.sin()
        } else {
            (sp1.sin() + sp2.sin()) / 2.0
        };

        let c = sp1.cos() * sp1.cos() + 2.0 * n * sp1.sin();
        let rho0 = earth_radius * (c - 2.0 * n * lat0.sin()).sqrt() / n;

        Self {
            lon0,
            lat0,
            sp1,
            sp2,
            false_easting,
            false_northing,
            earth_radius,
            n,
            c,
            rho0,
        }
    }

    /// USA Contiguous Albers Equal Area Conic (USGS version).
    ///
    /// Origin 23°N, central meridian 96°W, standard parallels 29.5°N and
    /// 45.5°N, no false offsets. Shared by ESRI:102039 and EPSG:5070.
    pub fn conus() -> Self {
        Self::new(23.0, -96.0, 29.5, 45.5, 0.0, 0.0)
    }

    /// Project (lon, lat) in degrees to (x, y) in meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let lon = lon_deg * to_rad;

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.earth_radius * (self.c - 2.0 * self.n * lat.sin()).sqrt() / self.n;
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;

        (x, y)
    }

    /// Unproject (x, y) in meters to (lon, lat) in degrees.
    ///
    /// Returns `None` when the point lies outside the projection's domain
    /// (no latitude maps to that rho).
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let to_deg = 180.0 / PI;

        let xs = x - self.false_easting;
        let ys = self.rho0 - (y - self.false_northing);

        let rho = (xs * xs + ys * ys).sqrt();
        let rho = if self.n < 0.0 { -rho } else { rho };

        let theta = xs.atan2(ys);

        // sin(lat) from the equal-area condition; out of [-1, 1] means the
        // point is not on the projected sphere
        let sin_lat =
            (self.c - (rho * self.n / self.earth_radius).powi(2)) / (2.0 * self.n);
        if !(-1.0..=1.0).contains(&sin_lat) {
            return None;
        }

        let lat = sin_lat.asin();
        let lon = self.lon0 + theta / self.n;

        Some((lon * to_deg, lat * to_deg))
    }
}
