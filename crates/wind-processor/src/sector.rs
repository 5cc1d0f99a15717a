//! Eight-point compass classification of wind direction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::types::{FieldSet, ScalarField, ValueKind, WIND_COMPASS_SECTOR, WIND_DIRECTION};

/// Number of compass sectors.
pub const SECTOR_COUNT: usize = 8;

/// Angular width of one sector, degrees.
pub const SECTOR_WIDTH_DEG: f64 = 45.0;

/// Eight-point compass rose. Discriminants are the stored sector indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompassSector {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl CompassSector {
    pub const ALL: [CompassSector; SECTOR_COUNT] = [
        CompassSector::North,
        CompassSector::NorthEast,
        CompassSector::East,
        CompassSector::SouthEast,
        CompassSector::South,
        CompassSector::SouthWest,
        CompassSector::West,
        CompassSector::NorthWest,
    ];

    /// Sector containing `direction` (degrees from north).
    ///
    /// Sectors are half-open and centred on multiples of 45°, so North covers
    /// `[337.5, 360) ∪ [0, 22.5)` and a direction of exactly 22.5° is NorthEast.
    pub fn from_direction(direction: f64) -> Option<Self> {
        if !direction.is_finite() {
            return None;
        }
        let shifted = (direction + SECTOR_WIDTH_DEG / 2.0).rem_euclid(360.0);
        let index = ((shifted / SECTOR_WIDTH_DEG).floor() as usize).min(SECTOR_COUNT - 1);
        Self::from_index(index)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Short compass label, e.g. "NE".
    pub fn label(&self) -> &'static str {
        match self {
            CompassSector::North => "N",
            CompassSector::NorthEast => "NE",
            CompassSector::East => "E",
            CompassSector::SouthEast => "SE",
            CompassSector::South => "S",
            CompassSector::SouthWest => "SW",
            CompassSector::West => "W",
            CompassSector::NorthWest => "NW",
        }
    }

    /// Central bearing of the sector.
    pub fn center_degrees(&self) -> f64 {
        self.index() as f64 * SECTOR_WIDTH_DEG
    }
}

impl fmt::Display for CompassSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sector index for one direction value; NaN stays NaN.
#[inline]
pub fn classify(direction: f32) -> f32 {
    match CompassSector::from_direction(f64::from(direction)) {
        Some(sector) => sector.index() as f32,
        None => f32::NAN,
    }
}

/// Classify every cell of a direction field.
pub fn classify_field(direction: &ScalarField) -> Result<ScalarField> {
    let data: Vec<f32> = direction.data().par_iter().map(|&d| classify(d)).collect();
    ScalarField::new(
        WIND_COMPASS_SECTOR,
        "",
        ValueKind::Categorical,
        *direction.geometry(),
        data,
    )
}

/// Return a copy of `set` with `wind_compass_sector` appended.
pub fn add_sector_band(set: &FieldSet) -> Result<FieldSet> {
    let sector = classify_field(set.band(WIND_DIRECTION)?)?;
    set.clone().with_band(sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let cases: &[(f32, f32)] = &[
            (0.0, 0.0),
            (22.4, 0.0),
            (22.5, 1.0),
            (44.9, 1.0),
            (67.4, 1.0),
            (67.5, 2.0),
            (90.0, 2.0),
            (180.0, 4.0),
            (270.0, 6.0),
            (337.4, 7.0),
            (337.5, 0.0),
            (359.9, 0.0),
        ];
        for &(direction, expected) in cases {
            assert_eq!(classify(direction), expected, "direction {}", direction);
        }
    }

    #[test]
    fn test_nan_passthrough() {
        assert!(classify(f32::NAN).is_nan());
    }

    #[test]
    fn test_every_direction_has_a_sector() {
        for tenth in 0..3600 {
            let s = classify(tenth as f32 / 10.0);
            assert!((0.0..8.0).contains(&s));
            assert_eq!(s.fract(), 0.0);
        }
    }

    #[test]
    fn test_labels_and_centers() {
        assert_eq!(CompassSector::from_index(5).unwrap().label(), "SW");
        assert_eq!(CompassSector::West.center_degrees(), 270.0);
        assert_eq!(CompassSector::from_direction(-10.0), Some(CompassSector::North));
        assert!(CompassSector::from_index(8).is_none());
    }
}
