//! Color ramps and grid-to-RGBA rendering.

use rayon::prelude::*;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Color at position `t` in `[0, 1]` of a ramp of evenly spaced stops.
pub fn ramp_color(colors: &[Color], t: f32) -> Color {
    match colors {
        [] => Color::transparent(),
        [only] => *only,
        _ => {
            let scaled = t.clamp(0.0, 1.0) * (colors.len() - 1) as f32;
            let low = (scaled.floor() as usize).min(colors.len() - 2);
            interpolate_color(colors[low], colors[low + 1], scaled - low as f32)
        }
    }
}

/// Render grid data to RGBA pixels.
///
/// NaN cells are fully transparent. `color_fn` receives the raw value.
///
/// # Returns
/// RGBA pixel data (4 bytes per pixel)
pub fn render_grid<F>(data: &[f32], width: usize, height: usize, color_fn: F) -> Vec<u8>
where
    F: Fn(f32) -> Color + Sync,
{
    let mut pixels = vec![0u8; width * height * 4];

    pixels
        .par_chunks_mut(4)
        .zip(data.par_iter())
        .for_each(|(pixel, &value)| {
            let color = if value.is_nan() {
                Color::transparent()
            } else {
                color_fn(value)
            };
            pixel.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        });

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        let colors = [Color::new(0, 0, 0, 255), Color::new(200, 100, 50, 255)];
        assert_eq!(ramp_color(&colors, 0.0), colors[0]);
        assert_eq!(ramp_color(&colors, 1.0), colors[1]);
        assert_eq!(ramp_color(&colors, 0.5), Color::new(100, 50, 25, 255));
    }

    #[test]
    fn test_ramp_hits_every_stop() {
        let colors: Vec<Color> = (0..8).map(|i| Color::new(i * 10, 0, 0, 255)).collect();
        for i in 0..8 {
            assert_eq!(ramp_color(&colors, i as f32 / 7.0), colors[i as usize]);
        }
    }

    #[test]
    fn test_render_grid_nan_transparent() {
        let pixels = render_grid(&[1.0, f32::NAN], 2, 1, |_| Color::new(9, 8, 7, 255));
        assert_eq!(pixels, vec![9, 8, 7, 255, 0, 0, 0, 0]);
    }
}
