//! Test data generation utilities.
//!
//! Builders for synthetic daily wind fields and a writer that lays them out
//! on disk the way [`ZarrDailySource`](crate::source::ZarrDailySource) reads
//! them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::Result;
use crate::source::{ZarrDailySource, ZarrFieldAttributes};
use crate::types::{FieldSet, GridGeometry, ScalarField, ValueKind};

/// Units written for synthetic wind components.
pub const WIND_UNITS: &str = "m s-1";

/// A day whose u and v components are given per cell.
pub fn wind_day(
    date: NaiveDate,
    geometry: GridGeometry,
    u_name: &str,
    v_name: &str,
    u: Vec<f32>,
    v: Vec<f32>,
) -> Result<FieldSet> {
    let u = ScalarField::new(u_name, WIND_UNITS, ValueKind::Continuous, geometry, u)?;
    let v = ScalarField::new(v_name, WIND_UNITS, ValueKind::Continuous, geometry, v)?;
    FieldSet::new(date).with_band(u)?.with_band(v)
}

/// A day with the same wind in every cell.
pub fn uniform_wind_day(
    date: NaiveDate,
    geometry: GridGeometry,
    u_name: &str,
    v_name: &str,
    u: f32,
    v: f32,
) -> Result<FieldSet> {
    let n = geometry.len();
    wind_day(date, geometry, u_name, v_name, vec![u; n], vec![v; n])
}

/// Components `(u, v)` of a wind blowing *from* `direction` degrees at `speed`.
pub fn components_from(direction: f32, speed: f32) -> (f32, f32) {
    let rad = direction.to_radians();
    (-speed * rad.sin(), -speed * rad.cos())
}

/// Write one field as `<root>/<date>/<variable>.zarr`.
pub fn write_daily_zarr(
    root: &Path,
    date: NaiveDate,
    variable: &str,
    field: &ScalarField,
    chunk_size: usize,
) -> std::result::Result<PathBuf, Box<dyn std::error::Error>> {
    let path = ZarrDailySource::array_path(root, date, variable);
    std::fs::create_dir_all(&path)?;
    let store = Arc::new(FilesystemStore::new(&path)?);

    let geometry = field.geometry();
    let attrs = ZarrFieldAttributes {
        parameter: variable.to_string(),
        units: field.units().to_string(),
        bbox: geometry.bbox.to_array(),
        crs: geometry.crs,
        missing_value: None,
    };

    let array = ArrayBuilder::new(
        vec![geometry.height as u64, geometry.width as u64],
        DataType::Float32,
        vec![chunk_size as u64, chunk_size as u64].try_into()?,
        FillValue::from(f32::NAN),
    )
    .attributes(attrs.to_map())
    .build(store, "/")?;

    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![geometry.height as u64, geometry.width as u64],
    )?;
    array.store_array_subset_elements(&subset, field.data())?;

    Ok(path)
}

/// Write every band of every day under `root`.
pub fn write_daily_series(
    root: &Path,
    days: &[FieldSet],
    chunk_size: usize,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    for day in days {
        for band in day.bands() {
            write_daily_zarr(root, day.date(), band.name(), band, chunk_size)?;
        }
    }
    Ok(())
}
