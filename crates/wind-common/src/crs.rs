//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BoundingBox;

/// WGS84 semi-major axis used by Web Mercator (meters).
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// CRS codes supported for source grids and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (EPSG:4326 with lon/lat axis order)
    /// - "EPSG:900913" (legacy Web Mercator alias)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Units of the CRS axes, as written into export metadata.
    pub fn units(&self) -> &'static str {
        match self {
            CrsCode::Epsg4326 => "degree",
            CrsCode::Epsg3857 => "metre",
        }
    }

    /// Convert WGS84 lon/lat (degrees) into this CRS.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg4326 => (lon, lat),
            CrsCode::Epsg3857 => {
                let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
                let x = EARTH_RADIUS_M * lon.to_radians();
                let y = EARTH_RADIUS_M
                    * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                        .tan()
                        .ln();
                (x, y)
            }
        }
    }

    /// Convert coordinates in this CRS back to WGS84 lon/lat (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg4326 => (x, y),
            CrsCode::Epsg3857 => {
                let lon = (x / EARTH_RADIUS_M).to_degrees();
                let lat = (y / EARTH_RADIUS_M).sinh().atan().to_degrees();
                (lon, lat)
            }
        }
    }

    /// Project a geographic bounding box into this CRS.
    ///
    /// Both supported projections are monotonic per axis, so the corners suffice.
    pub fn project_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        let (min_x, min_y) = self.forward(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = self.forward(bbox.max_x, bbox.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

impl Default for CrsCode {
    fn default() -> Self {
        CrsCode::Epsg4326
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
