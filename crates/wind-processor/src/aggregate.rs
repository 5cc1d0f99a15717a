//! Per-cell temporal reducers over a daily series.
//!
//! Every reducer ignores missing (NaN) samples. A cell with no valid sample
//! in any day is NaN in the output.

use rayon::prelude::*;

use crate::error::{ProcessorError, Result};
use crate::sector::SECTOR_COUNT;
use crate::types::{FieldSet, ScalarField, ValueKind};

/// Median of the valid samples; NaN when there are none.
///
/// With an even number of samples the two middle values are averaged.
pub fn median(samples: &mut Vec<f32>) -> f32 {
    samples.retain(|v| !v.is_nan());
    let n = samples.len();
    if n == 0 {
        return f32::NAN;
    }
    samples.sort_unstable_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        ((f64::from(samples[n / 2 - 1]) + f64::from(samples[n / 2])) / 2.0) as f32
    }
}

/// Most frequent sector index; ties go to the lowest index. NaN when empty.
pub fn mode_sector<I>(samples: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let mut counts = [0usize; SECTOR_COUNT];
    for v in samples {
        if v.is_nan() || v < 0.0 {
            continue;
        }
        let idx = v as usize;
        if idx < SECTOR_COUNT {
            counts[idx] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (idx, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((idx, count)),
        }
    }

    best.map_or(f32::NAN, |(idx, _)| idx as f32)
}

/// Collect one band from every day, checking that all days share a grid.
pub fn collect_band<'a>(series: &'a [FieldSet], band: &str) -> Result<Vec<&'a ScalarField>> {
    let fields = series
        .iter()
        .map(|set| set.band(band))
        .collect::<Result<Vec<_>>>()?;
    check_series(&fields, band)?;
    Ok(fields)
}

fn check_series(fields: &[&ScalarField], band: &str) -> Result<()> {
    let first = fields.first().ok_or_else(|| ProcessorError::EmptySeries {
        window: format!("band '{}'", band),
    })?;
    for field in &fields[1..] {
        first
            .geometry()
            .ensure_coregistered(field.geometry(), &format!("series of '{}'", band))?;
    }
    Ok(())
}

/// Per-cell median of a continuous band.
pub fn median_field(fields: &[&ScalarField], name: &str) -> Result<ScalarField> {
    check_series(fields, name)?;
    let first = fields[0];
    let n = fields.len();

    let data: Vec<f32> = (0..first.geometry().len())
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(n),
            |buf, i| {
                buf.clear();
                buf.extend(fields.iter().map(|f| f.data()[i]));
                median(buf)
            },
        )
        .collect();

    ScalarField::new(name, first.units(), ValueKind::Continuous, *first.geometry(), data)
}

/// Per-cell mode of a sector band.
pub fn mode_field(fields: &[&ScalarField], name: &str) -> Result<ScalarField> {
    check_series(fields, name)?;
    let first = fields[0];

    let data: Vec<f32> = (0..first.geometry().len())
        .into_par_iter()
        .map(|i| mode_sector(fields.iter().map(|f| f.data()[i])))
        .collect();

    ScalarField::new(name, "", ValueKind::Categorical, *first.geometry(), data)
}
