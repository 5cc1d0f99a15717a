//! Daily fields stored as Zarr V3 arrays on a local filesystem.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   2024-06-01/
//!     u_component_of_wind_10m.zarr/
//!     v_component_of_wind_10m.zarr/
//!   2024-06-02/
//!     ...
//! ```
//!
//! Each array is 2-D `[rows, cols]`, north row first, and carries `units`,
//! `bbox` (`[min_x, min_y, max_x, max_y]`) and an optional `crs` attribute.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wind_common::{AreaOfInterest, BoundingBox, CrsCode};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;
use zarrs_storage::ReadableStorage;

use super::{FetchRequest, GridSource};
use crate::clip::crop_window;
use crate::error::{ProcessorError, Result};
use crate::types::{FieldSet, GridGeometry, ScalarField, ValueKind};

const DAY_DIR_FORMAT: &str = "%Y-%m-%d";

/// Attributes stored alongside each daily array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZarrFieldAttributes {
    #[serde(default)]
    pub parameter: String,
    #[serde(default)]
    pub units: String,
    pub bbox: [f64; 4],
    #[serde(default)]
    pub crs: CrsCode,
    /// Sentinel for missing cells, in addition to NaN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_value: Option<f32>,
}

impl ZarrFieldAttributes {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3])
    }

    /// Parse from an array's attribute map.
    pub fn from_map(attrs: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(attrs.clone()))
            .map_err(|e| ProcessorError::invalid_metadata(format!("array attributes: {}", e)))
    }

    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Reads `<root>/<date>/<variable>.zarr` arrays.
#[derive(Debug, Clone)]
pub struct ZarrDailySource {
    root: PathBuf,
    name: String,
}

impl ZarrDailySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("zarr:{}", root.display());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one variable on one day.
    pub fn array_path(root: &Path, date: NaiveDate, variable: &str) -> PathBuf {
        root.join(date.format(DAY_DIR_FORMAT).to_string())
            .join(format!("{}.zarr", variable))
    }

    /// Date of a day directory; only the canonical `YYYY-MM-DD` spelling counts.
    fn parse_day_dir(name: &str) -> Option<NaiveDate> {
        let date = NaiveDate::parse_from_str(name, DAY_DIR_FORMAT).ok()?;
        (date.format(DAY_DIR_FORMAT).to_string() == name).then_some(date)
    }

    /// Dated subdirectories inside the window, ascending.
    fn list_days(root: &Path, request: &FetchRequest) -> Result<Vec<(NaiveDate, PathBuf)>> {
        let entries = std::fs::read_dir(root).map_err(|e| {
            ProcessorError::source_unavailable(format!("{}: {}", root.display(), e))
        })?;

        let mut days = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(Self::parse_day_dir) else {
                debug!(entry = ?name, "Skipping non-date entry");
                continue;
            };
            if request.window.contains(date) {
                days.push((date, entry.path()));
            }
        }

        days.sort_by_key(|(date, _)| *date);
        Ok(days)
    }

    /// Read the AOI-covering window of one array, `None` if it misses the AOI.
    fn read_variable(
        path: &Path,
        date: NaiveDate,
        variable: &str,
        aoi: &AreaOfInterest,
    ) -> Result<Option<ScalarField>> {
        if !path.is_dir() {
            return Err(ProcessorError::MissingVariable {
                variable: variable.to_string(),
                date,
            });
        }

        let store = FilesystemStore::new(path)
            .map_err(|e| ProcessorError::storage_error(format!("{}: {}", path.display(), e)))?;
        let store: ReadableStorage = Arc::new(store);
        let array = Array::open(store, "/")
            .map_err(|e| ProcessorError::zarr_error(format!("{}: {}", path.display(), e)))?;

        let shape = array.shape();
        if shape.len() != 2 {
            return Err(ProcessorError::invalid_metadata(format!(
                "{}: expected a 2-D array, got {} dimensions",
                path.display(),
                shape.len()
            )));
        }

        let attrs = ZarrFieldAttributes::from_map(array.attributes())?;
        let full = GridGeometry::new(shape[1] as usize, shape[0] as usize, attrs.bbox(), attrs.crs);

        let Some(window) = crop_window(&full, aoi) else {
            return Ok(None);
        };

        let subset = ArraySubset::new_with_start_shape(
            vec![window.row as u64, window.col as u64],
            vec![window.rows as u64, window.cols as u64],
        )
        .map_err(|e| ProcessorError::zarr_error(e.to_string()))?;

        let mut data: Vec<f32> = array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| ProcessorError::zarr_error(format!("{}: {}", path.display(), e)))?;

        if let Some(missing) = attrs.missing_value {
            for v in data.iter_mut().filter(|v| **v == missing) {
                *v = f32::NAN;
            }
        }

        let field = ScalarField::new(
            variable,
            attrs.units,
            ValueKind::Continuous,
            window.geometry(&full),
            data,
        )?;
        Ok(Some(field))
    }

    fn read_days(root: &Path, request: &FetchRequest) -> Result<Vec<FieldSet>> {
        let days = Self::list_days(root, request)?;
        let mut out = Vec::with_capacity(days.len());

        'days: for (date, dir) in days {
            let mut set = FieldSet::new(date);
            for variable in &request.variables {
                let path = dir.join(format!("{}.zarr", variable));
                match Self::read_variable(&path, date, variable, &request.aoi)? {
                    Some(field) => set.insert(field)?,
                    None => {
                        warn!(%date, variable = %variable, "Grid does not overlap AOI, skipping day");
                        continue 'days;
                    }
                }
            }
            out.push(set);
        }

        Ok(out)
    }
}

#[async_trait]
impl GridSource for ZarrDailySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<FieldSet>> {
        let root = self.root.clone();
        let owned = request.clone();

        let days = tokio::task::spawn_blocking(move || Self::read_days(&root, &owned))
            .await
            .map_err(|e| ProcessorError::source_unavailable(format!("reader task failed: {}", e)))??;

        info!(
            source = %self.name,
            window = %request.window,
            days = days.len(),
            "Fetched daily fields"
        );
        Ok(days)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
