//! Cartesian (u, v) wind components to polar speed and direction.
//!
//! Direction follows the meteorological convention: the bearing the wind
//! blows *from*, clockwise from north, in `[0, 360)`.

use rayon::prelude::*;

use crate::error::Result;
use crate::types::{FieldSet, ScalarField, ValueKind, WIND_DIRECTION, WIND_SPEED};

/// Wind speed `sqrt(u² + v²)`. NaN if either component is missing.
#[inline]
pub fn wind_speed(u: f32, v: f32) -> f32 {
    if u.is_nan() || v.is_nan() {
        return f32::NAN;
    }
    u.hypot(v)
}

/// Bearing the wind blows from, degrees in `[0, 360)`.
///
/// A flow toward the north (`u = 0, v > 0`) comes from the south (180°),
/// a flow toward the east (`u > 0, v = 0`) comes from the west (270°).
/// Calm cells (`u = v = 0`) have no direction and yield NaN.
#[inline]
pub fn wind_direction(u: f32, v: f32) -> f32 {
    if u.is_nan() || v.is_nan() || (u == 0.0 && v == 0.0) {
        return f32::NAN;
    }
    let degrees = (f64::from(u).atan2(f64::from(v)).to_degrees() + 180.0).rem_euclid(360.0);
    let degrees = degrees as f32;
    // Rounding at the f32 cast can land exactly on 360.
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Derive speed and direction bands from co-registered u and v bands.
pub fn derive_polar(u: &ScalarField, v: &ScalarField) -> Result<(ScalarField, ScalarField)> {
    u.geometry().ensure_coregistered(v.geometry(), "u/v components")?;

    let (speed, direction): (Vec<f32>, Vec<f32>) = u
        .data()
        .par_iter()
        .zip(v.data().par_iter())
        .map(|(&u, &v)| (wind_speed(u, v), wind_direction(u, v)))
        .unzip();

    let geometry = *u.geometry();
    let speed = ScalarField::new(WIND_SPEED, u.units(), ValueKind::Continuous, geometry, speed)?;
    let direction = ScalarField::new(WIND_DIRECTION, "deg", ValueKind::Continuous, geometry, direction)?;
    Ok((speed, direction))
}

/// Return a copy of `set` with `wind_speed` and `wind_direction` appended.
pub fn add_polar_bands(set: &FieldSet, u_band: &str, v_band: &str) -> Result<FieldSet> {
    let (speed, direction) = derive_polar(set.band(u_band)?, set.band(v_band)?)?;
    set.clone().with_band(speed)?.with_band(direction)
}
