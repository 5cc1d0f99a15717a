//! Visualization parameters for quicklook rendering.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::gradient::Color;

/// Linear stretch of `[min, max]` across an evenly spaced palette.
///
/// Values below `min` or above `max` take the first or last color.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VisParams {
    pub min: f32,
    pub max: f32,
    pub palette: Vec<String>,
}

impl VisParams {
    pub fn new(min: f32, max: f32, palette: &[&str]) -> Self {
        Self {
            min,
            max,
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Diverging blue-to-red ramp for wind speed, 0-10 m/s.
    pub fn wind_speed() -> Self {
        Self::new(0.0, 10.0, &["#313695", "#74add1", "#ffffbf", "#f46d43", "#a50026"])
    }

    /// One qualitative color per compass sector, N through NW.
    pub fn wind_sector() -> Self {
        Self::new(
            0.0,
            7.0,
            &[
                "#e31a1c", "#ff7f00", "#6a3d9a", "#a6cee3", "#1f78b4", "#33a02c", "#b2df8a",
                "#fb9a99",
            ],
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min >= self.max {
            return Err(RenderError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        self.colors().map(|_| ())
    }

    /// Parsed palette colors, all opaque.
    pub fn colors(&self) -> Result<Vec<Color>> {
        if self.palette.is_empty() {
            return Err(RenderError::EmptyPalette);
        }
        self.palette
            .iter()
            .map(|hex| {
                hex_to_rgb(hex)
                    .map(|(r, g, b)| Color::new(r, g, b, 255))
                    .ok_or_else(|| RenderError::InvalidColor(hex.clone()))
            })
            .collect()
    }

    /// Position of `value` in `[0, 1]` along the stretch.
    pub fn normalize(&self, value: f32) -> f32 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}
