//! Export grid planning and resampling between CRSs.
//!
//! An export is described by a target CRS and a square cell size. The
//! target grid is anchored at the north-west corner of the source extent
//! (projected into the target CRS) and sized to cover it with whole cells.

pub mod interpolation;

use rayon::prelude::*;
use serde::Serialize;
use wind_common::{BoundingBox, CrsCode};

pub use interpolation::{bilinear_interpolate, nearest_interpolate};

use crate::error::{ProcessorError, Result};
use crate::types::{GridGeometry, ScalarField, ValueKind};

/// Tolerance, in cells, before an extra row/column is added to cover the extent.
const COVER_EPSILON: f64 = 1e-9;

/// Target grid of an export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportPlan {
    pub width: usize,
    pub height: usize,
    pub bbox: BoundingBox,
    pub crs: CrsCode,
    pub resolution: f64,
}

impl ExportPlan {
    /// Total cell count.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(self.width, self.height, self.bbox, self.crs)
    }

    /// Fail with `ExportTooLarge` when the plan exceeds `max_pixels`.
    pub fn check_budget(&self, max_pixels: u64) -> Result<()> {
        if self.pixels() > max_pixels {
            return Err(ProcessorError::ExportTooLarge {
                pixels: self.pixels(),
                max_pixels,
            });
        }
        Ok(())
    }
}

/// Source extent expressed in `crs`.
pub fn extent_in(geometry: &GridGeometry, crs: CrsCode) -> BoundingBox {
    if geometry.crs == crs {
        return geometry.bbox;
    }
    let b = &geometry.bbox;
    let (min_lon, min_lat) = geometry.crs.inverse(b.min_x, b.min_y);
    let (max_lon, max_lat) = geometry.crs.inverse(b.max_x, b.max_y);
    crs.project_bbox(&BoundingBox::new(min_lon, min_lat, max_lon, max_lat))
}

/// Plan the target grid for exporting `geometry` at `resolution` in `crs`.
///
/// The pixel budget is checked here, before any grid is allocated.
pub fn plan_export(
    geometry: &GridGeometry,
    resolution: f64,
    crs: CrsCode,
    max_pixels: u64,
) -> Result<ExportPlan> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(ProcessorError::InvalidExport(format!(
            "resolution must be a positive number, got {}",
            resolution
        )));
    }

    let extent = extent_in(geometry, crs);
    let cols = (extent.width() / resolution - COVER_EPSILON).ceil().max(1.0);
    let rows = (extent.height() / resolution - COVER_EPSILON).ceil().max(1.0);

    let pixels = cols * rows;
    if !pixels.is_finite() || pixels > max_pixels as f64 {
        return Err(ProcessorError::ExportTooLarge {
            pixels: if pixels.is_finite() { pixels as u64 } else { u64::MAX },
            max_pixels,
        });
    }

    let width = cols as usize;
    let height = rows as usize;
    let bbox = BoundingBox::new(
        extent.min_x,
        extent.max_y - height as f64 * resolution,
        extent.min_x + width as f64 * resolution,
        extent.max_y,
    );

    Ok(ExportPlan {
        width,
        height,
        bbox,
        crs,
        resolution,
    })
}

/// Resample `field` onto the plan's grid.
///
/// Categorical fields use nearest neighbour, continuous fields bilinear.
pub fn resample_to_plan(field: &ScalarField, plan: &ExportPlan) -> Result<ScalarField> {
    let target = plan.geometry();
    let source = *field.geometry();

    if target.is_coregistered(&source) {
        return field.with_grid(target, field.data().to_vec());
    }

    let (sdx, sdy) = source.resolution();
    let sample: fn(&[f32], usize, usize, f64, f64) -> f32 = match field.kind() {
        ValueKind::Categorical => nearest_interpolate,
        ValueKind::Continuous => bilinear_interpolate,
    };

    let mut data = vec![f32::NAN; target.len()];
    data.par_chunks_mut(target.width)
        .enumerate()
        .for_each(|(row, out_row)| {
            for (col, out) in out_row.iter_mut().enumerate() {
                let (x, y) = target.cell_center(col, row);
                let (sx, sy) = if source.crs == target.crs {
                    (x, y)
                } else {
                    let (lon, lat) = target.crs.inverse(x, y);
                    source.crs.forward(lon, lat)
                };
                let fx = (sx - source.bbox.min_x) / sdx - 0.5;
                let fy = (source.bbox.max_y - sy) / sdy - 0.5;
                *out = sample(field.data(), source.width, source.height, fx, fy);
            }
        });

    field.with_grid(target, data)
}
