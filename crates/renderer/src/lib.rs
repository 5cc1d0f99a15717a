//! Quicklook rendering for wind summary rasters.
//!
//! Turns a row-major `f32` grid into a small PNG using a linear color
//! stretch ([`VisParams`]). NaN cells render fully transparent.

pub mod error;
pub mod gradient;
pub mod png;
pub mod style;

pub use error::{RenderError, Result};
pub use gradient::{interpolate_color, ramp_color, render_grid, Color};
pub use style::{hex_to_rgb, VisParams};

use tracing::debug;

/// Colorize `data` with `vis` and return RGBA pixels.
pub fn apply_vis_params(data: &[f32], width: usize, height: usize, vis: &VisParams) -> Result<Vec<u8>> {
    if data.len() != width * height {
        return Err(RenderError::SizeMismatch {
            width,
            height,
            len: data.len(),
        });
    }
    vis.validate()?;
    let colors = vis.colors()?;
    Ok(render_grid(data, width, height, |value| {
        ramp_color(&colors, vis.normalize(value))
    }))
}

/// Render `data` to PNG bytes.
pub fn render_quicklook(data: &[f32], width: usize, height: usize, vis: &VisParams) -> Result<Vec<u8>> {
    let pixels = apply_vis_params(data, width, height, vis)?;
    let png = png::create_png_auto(&pixels, width, height)?;
    debug!(width, height, bytes = png.len(), "Rendered quicklook");
    Ok(png)
}
