//! Core grid types: geometry, single-band fields and per-day field sets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wind_common::{BoundingBox, CrsCode};

use crate::error::{ProcessorError, Result};

/// Wind speed band, m/s.
pub const WIND_SPEED: &str = "wind_speed";
/// Direction the wind blows from, degrees clockwise from north.
pub const WIND_DIRECTION: &str = "wind_direction";
/// Compass sector index 0..=7.
pub const WIND_COMPASS_SECTOR: &str = "wind_compass_sector";
/// Per-cell temporal median of [`WIND_SPEED`].
pub const MEDIAN_WIND_SPEED: &str = "median_wind_speed";
/// Per-cell temporal mode of [`WIND_COMPASS_SECTOR`].
pub const DOMINANT_WIND_SECTOR: &str = "dominant_wind_sector";

/// Relative tolerance (in cell sizes) when comparing grid extents.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// Regular grid placement.
///
/// Rows run from north (`bbox.max_y`) to south, columns from west to east.
/// Cell `(col, row)` covers
/// `[min_x + col*dx, min_x + (col+1)*dx] x [max_y - (row+1)*dy, max_y - row*dy]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,
    pub bbox: BoundingBox,
    pub crs: CrsCode,
}

impl GridGeometry {
    pub fn new(width: usize, height: usize, bbox: BoundingBox, crs: CrsCode) -> Self {
        Self {
            width,
            height,
            bbox,
            crs,
        }
    }

    /// Cell size `(dx, dy)` in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.width as f64,
            self.bbox.height() / self.height as f64,
        )
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Center of cell `(col, row)` in CRS units.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let (dx, dy) = self.resolution();
        (
            self.bbox.min_x + (col as f64 + 0.5) * dx,
            self.bbox.max_y - (row as f64 + 0.5) * dy,
        )
    }

    /// True when both grids share shape, CRS and extent.
    pub fn is_coregistered(&self, other: &GridGeometry) -> bool {
        if self.width != other.width || self.height != other.height || self.crs != other.crs {
            return false;
        }
        let (dx, dy) = self.resolution();
        let tolerance = dx.abs().min(dy.abs()) * GEOMETRY_TOLERANCE;
        self.bbox.approx_eq(&other.bbox, tolerance)
    }

    pub(crate) fn ensure_coregistered(&self, other: &GridGeometry, context: &str) -> Result<()> {
        if self.is_coregistered(other) {
            Ok(())
        } else {
            Err(ProcessorError::geometry_mismatch(format!(
                "{}: {}x{} {:?} ({}) vs {}x{} {:?} ({})",
                context,
                self.width,
                self.height,
                self.bbox.to_array(),
                self.crs,
                other.width,
                other.height,
                other.bbox.to_array(),
                other.crs
            )))
        }
    }
}

/// Whether a band holds measurements or class labels.
///
/// Categorical bands are resampled with nearest neighbour and exported as
/// integers; continuous bands are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Continuous,
    Categorical,
}

/// A single named band on a regular grid. Missing cells are NaN.
#[derive(Debug, Clone)]
pub struct ScalarField {
    name: String,
    units: String,
    kind: ValueKind,
    geometry: GridGeometry,
    data: Vec<f32>,
}

impl ScalarField {
    /// Create a field; `data` must be row-major with one value per cell.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        kind: ValueKind,
        geometry: GridGeometry,
        data: Vec<f32>,
    ) -> Result<Self> {
        let name = name.into();
        if data.len() != geometry.len() {
            return Err(ProcessorError::geometry_mismatch(format!(
                "band '{}' has {} values for a {}x{} grid",
                name,
                data.len(),
                geometry.width,
                geometry.height
            )));
        }
        Ok(Self {
            name,
            units: units.into(),
            kind,
            geometry,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Row-major cell values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(col, row)`, `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.geometry.width || row >= self.geometry.height {
            return None;
        }
        self.data.get(row * self.geometry.width + col).copied()
    }

    /// Number of non-NaN cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Min and max over valid cells.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Replace the values (and grid) while keeping name, units and kind.
    pub(crate) fn with_grid(&self, geometry: GridGeometry, data: Vec<f32>) -> Result<Self> {
        Self::new(
            self.name.clone(),
            self.units.clone(),
            self.kind,
            geometry,
            data,
        )
    }
}

/// Bitwise-NaN-aware equality: two missing cells compare equal.
impl PartialEq for ScalarField {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.units == other.units
            && self.kind == other.kind
            && self.geometry.is_coregistered(&other.geometry)
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a.is_nan() && b.is_nan()) || a == b)
    }
}

/// All bands for one day, sharing a single grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    date: NaiveDate,
    bands: BTreeMap<String, ScalarField>,
}

impl FieldSet {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bands: BTreeMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Append a band. It must be co-registered with the bands already present.
    pub fn with_band(mut self, field: ScalarField) -> Result<Self> {
        self.insert(field)?;
        Ok(self)
    }

    pub fn insert(&mut self, field: ScalarField) -> Result<()> {
        if self.bands.contains_key(field.name()) {
            return Err(ProcessorError::DuplicateBand(field.name().to_string()));
        }
        if let Some(existing) = self.geometry() {
            existing.ensure_coregistered(field.geometry(), field.name())?;
        }
        self.bands.insert(field.name().to_string(), field);
        Ok(())
    }

    /// Look up a band, reporting the day if it is missing.
    pub fn band(&self, name: &str) -> Result<&ScalarField> {
        self.bands
            .get(name)
            .ok_or_else(|| ProcessorError::MissingVariable {
                variable: name.to_string(),
                date: self.date,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    pub fn bands(&self) -> impl Iterator<Item = &ScalarField> {
        self.bands.values()
    }

    /// Shared grid of the bands, `None` while empty.
    pub fn geometry(&self) -> Option<&GridGeometry> {
        self.bands.values().next().map(ScalarField::geometry)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Keep only the named bands; every name must be present.
    pub fn select(&self, names: &[impl AsRef<str>]) -> Result<FieldSet> {
        let mut out = FieldSet::new(self.date);
        for name in names {
            out.insert(self.band(name.as_ref())?.clone())?;
        }
        Ok(out)
    }
}
