//! Area of interest: the single polygon every computation is restricted to.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Serialized form of an AOI: a name and a ring of `[lon, lat]` vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoiDefinition {
    #[serde(default = "default_aoi_name")]
    pub name: String,
    pub coordinates: Vec<[f64; 2]>,
}

fn default_aoi_name() -> String {
    "aoi".to_string()
}

/// A closed polygon in geographic coordinates (EPSG:4326).
///
/// The ring is always stored closed (first vertex repeated at the end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AoiDefinition", into = "AoiDefinition")]
pub struct AreaOfInterest {
    name: String,
    ring: Vec<(f64, f64)>,
    bbox: BoundingBox,
}

impl AreaOfInterest {
    /// Build an AOI from `[lon, lat]` vertices, closing the ring if needed.
    pub fn new(name: impl Into<String>, coordinates: &[[f64; 2]]) -> Result<Self, AoiError> {
        let mut ring: Vec<(f64, f64)> = coordinates.iter().map(|c| (c[0], c[1])).collect();

        for &(lon, lat) in &ring {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(AoiError::NonFinite);
            }
            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                return Err(AoiError::OutOfRange { lon, lat });
            }
        }

        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }

        let distinct = ring.len().saturating_sub(1);
        if distinct < 3 {
            return Err(AoiError::TooFewVertices(distinct));
        }

        if shoelace_area(&ring).abs() < 1e-12 {
            return Err(AoiError::Degenerate);
        }

        let bbox = BoundingBox::enclosing(ring.iter().copied()).ok_or(AoiError::TooFewVertices(0))?;

        Ok(Self {
            name: name.into(),
            ring,
            bbox,
        })
    }

    /// Axis-aligned rectangle from a bounding box.
    pub fn from_bbox(name: impl Into<String>, bbox: &BoundingBox) -> Result<Self, AoiError> {
        Self::new(
            name,
            &[
                [bbox.min_x, bbox.max_y],
                [bbox.min_x, bbox.min_y],
                [bbox.max_x, bbox.min_y],
                [bbox.max_x, bbox.max_y],
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closed ring of `(lon, lat)` vertices.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Bounding box of the polygon.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Check if a point is inside the polygon using ray casting.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        if !self.bbox.contains_point(lon, lat) {
            return false;
        }

        let n = self.ring.len();
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let (xi, yi) = self.ring[i];
            let (xj, yj) = self.ring[j];

            if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

impl TryFrom<AoiDefinition> for AreaOfInterest {
    type Error = AoiError;

    fn try_from(def: AoiDefinition) -> Result<Self, Self::Error> {
        Self::new(def.name, &def.coordinates)
    }
}

impl From<AreaOfInterest> for AoiDefinition {
    fn from(aoi: AreaOfInterest) -> Self {
        Self {
            name: aoi.name,
            coordinates: aoi.ring.iter().map(|&(x, y)| [x, y]).collect(),
        }
    }
}

/// Signed area of a closed ring (shoelace formula).
fn shoelace_area(ring: &[(f64, f64)]) -> f64 {
    ring.windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum::<f64>()
        / 2.0
}

#[derive(Debug, thiserror::Error)]
pub enum AoiError {
    #[error("AOI needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("AOI vertex ({lon}, {lat}) is outside lon [-180, 180] / lat [-90, 90]")]
    OutOfRange { lon: f64, lat: f64 },

    #[error("AOI contains a non-finite coordinate")]
    NonFinite,

    #[error("AOI polygon has zero area")]
    Degenerate,
}
