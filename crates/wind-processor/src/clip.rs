//! Restrict fields to the area of interest.
//!
//! Clipping crops a field to the whole cells covering the AOI's bounding box,
//! then masks cells whose centre falls outside the polygon. Clipping an
//! already clipped field is a no-op.

use rayon::prelude::*;
use wind_common::{AreaOfInterest, BoundingBox};

use crate::error::{ProcessorError, Result};
use crate::types::{FieldSet, GridGeometry, ScalarField};

/// Snap tolerance, in cells, for AOI edges that fall on cell boundaries.
const EDGE_EPSILON: f64 = 1e-9;

/// A rectangular block of cells within a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub col: usize,
    pub row: usize,
    pub cols: usize,
    pub rows: usize,
}

impl CellWindow {
    /// Geometry of the window's cells.
    pub fn geometry(&self, parent: &GridGeometry) -> GridGeometry {
        let (dx, dy) = parent.resolution();
        let min_x = parent.bbox.min_x + self.col as f64 * dx;
        let max_y = parent.bbox.max_y - self.row as f64 * dy;
        GridGeometry::new(
            self.cols,
            self.rows,
            BoundingBox::new(
                min_x,
                max_y - self.rows as f64 * dy,
                min_x + self.cols as f64 * dx,
                max_y,
            ),
            parent.crs,
        )
    }

    /// True when the window spans the whole parent grid.
    pub fn is_full(&self, parent: &GridGeometry) -> bool {
        self.col == 0 && self.row == 0 && self.cols == parent.width && self.rows == parent.height
    }
}

/// Whole cells of `geometry` covering the AOI bounding box, or `None` if the
/// AOI does not overlap the grid.
pub fn crop_window(geometry: &GridGeometry, aoi: &AreaOfInterest) -> Option<CellWindow> {
    if geometry.is_empty() {
        return None;
    }
    let aoi_bbox = geometry.crs.project_bbox(&aoi.bbox());
    let overlap = geometry.bbox.intersection(&aoi_bbox)?;
    let (dx, dy) = geometry.resolution();

    let span = |lo: f64, hi: f64, cell: f64, limit: usize| -> (usize, usize) {
        let start = ((lo / cell + EDGE_EPSILON).floor().max(0.0) as usize).min(limit - 1);
        let end = ((hi / cell - EDGE_EPSILON).ceil().max(0.0) as usize).min(limit);
        (start, end.max(start + 1))
    };

    let (col0, col1) = span(
        overlap.min_x - geometry.bbox.min_x,
        overlap.max_x - geometry.bbox.min_x,
        dx,
        geometry.width,
    );
    let (row0, row1) = span(
        geometry.bbox.max_y - overlap.max_y,
        geometry.bbox.max_y - overlap.min_y,
        dy,
        geometry.height,
    );

    Some(CellWindow {
        col: col0,
        row: row0,
        cols: col1 - col0,
        rows: row1 - row0,
    })
}

fn out_of_bounds(geometry: &GridGeometry, aoi: &AreaOfInterest) -> ProcessorError {
    ProcessorError::OutOfBounds {
        aoi: format!("'{}' {:?}", aoi.name(), aoi.bbox().to_array()),
        grid: format!("{:?} ({})", geometry.bbox.to_array(), geometry.crs),
    }
}

/// Crop and mask one field to the AOI.
pub fn clip(field: &ScalarField, aoi: &AreaOfInterest) -> Result<ScalarField> {
    let parent = field.geometry();
    let window = crop_window(parent, aoi).ok_or_else(|| out_of_bounds(parent, aoi))?;
    let geometry = window.geometry(parent);

    let mut data = vec![f32::NAN; geometry.len()];
    data.par_chunks_mut(window.cols)
        .enumerate()
        .for_each(|(r, out_row)| {
            let src_start = (window.row + r) * parent.width + window.col;
            let src_row = &field.data()[src_start..src_start + window.cols];
            for (c, (out, &value)) in out_row.iter_mut().zip(src_row).enumerate() {
                if value.is_nan() {
                    continue;
                }
                let (x, y) = geometry.cell_center(c, r);
                let (lon, lat) = geometry.crs.inverse(x, y);
                if aoi.contains_point(lon, lat) {
                    *out = value;
                }
            }
        });

    field.with_grid(geometry, data)
}

/// Clip every band of a day.
pub fn clip_set(set: &FieldSet, aoi: &AreaOfInterest) -> Result<FieldSet> {
    let mut out = FieldSet::new(set.date());
    for band in set.bands() {
        out.insert(clip(band, aoi)?)?;
    }
    Ok(out)
}
