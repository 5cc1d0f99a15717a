//! Sampling a grid at fractional cell positions.
//!
//! Positions are in cell-index space with cell centres on integers, so
//! `(0.0, 0.0)` is the centre of the north-west cell and the grid covers
//! `[-0.5, width - 0.5] x [-0.5, height - 0.5]`.

/// True when `(x, y)` lies over the grid.
#[inline]
fn covers(width: usize, height: usize, x: f64, y: f64) -> bool {
    x >= -0.5 && y >= -0.5 && x <= width as f64 - 0.5 && y <= height as f64 - 0.5
}

/// Nearest neighbour sampling.
///
/// Returns the value of the cell containing the position, NaN off the grid.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 || !covers(width, height, x, y) {
        return f32::NAN;
    }

    let col = (x.round().max(0.0) as usize).min(width - 1);
    let row = (y.round().max(0.0) as usize).min(height - 1);

    data[row * width + col]
}

/// Bilinear interpolation between the four surrounding cell centres.
///
/// Missing corners are dropped and the remaining weights renormalised. A
/// position whose own cell is missing stays missing, so masks do not grow.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if nearest_interpolate(data, width, height, x, y).is_nan() {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let corners = [
        (data[y0 * width + x0], (1.0 - xf) * (1.0 - yf)),
        (data[y0 * width + x1], xf * (1.0 - yf)),
        (data[y1 * width + x0], (1.0 - xf) * yf),
        (data[y1 * width + x1], xf * yf),
    ];

    let (sum, weight) = corners
        .iter()
        .filter(|(v, w)| !v.is_nan() && *w > 0.0)
        .fold((0.0f64, 0.0f64), |(s, tw), &(v, w)| (s + f64::from(v) * w, tw + w));

    if weight <= 0.0 {
        return f32::NAN;
    }

    (sum / weight) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_interpolate() {
        let data: Vec<f32> = vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ];

        assert_eq!(nearest_interpolate(&data, 3, 3, 0.0, 0.0), 1.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 1.0, 1.0), 5.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 0.4, 0.4), 1.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, 0.6, 0.6), 5.0);
        assert_eq!(nearest_interpolate(&data, 3, 3, -0.4, 2.4), 7.0);
        assert!(nearest_interpolate(&data, 3, 3, -0.6, 0.0).is_nan());
        assert!(nearest_interpolate(&data, 3, 3, 0.0, 2.6).is_nan());
    }

    #[test]
    fn test_bilinear_interpolate() {
        let data: Vec<f32> = vec![
            1.0, 2.0,
            3.0, 4.0,
        ];

        // Corners
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 0.0), 2.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.0, 1.0), 3.0);
        assert_eq!(bilinear_interpolate(&data, 2, 2, 1.0, 1.0), 4.0);

        // Center
        assert_eq!(bilinear_interpolate(&data, 2, 2, 0.5, 0.5), 2.5);

        // Outer half-cell clamps to the edge value
        assert_eq!(bilinear_interpolate(&data, 2, 2, -0.3, 0.0), 1.0);
    }

    #[test]
    fn test_bilinear_skips_missing_corners() {
        let data: Vec<f32> = vec![
            1.0, f32::NAN,
            3.0, 5.0,
        ];

        // Own cell (0, 0) is valid; the NaN neighbour is dropped.
        let v = bilinear_interpolate(&data, 2, 2, 0.4, 0.4);
        assert!(!v.is_nan());
        assert!(v > 1.0 && v < 5.0);

        // Own cell is NaN
        assert!(bilinear_interpolate(&data, 2, 2, 0.9, 0.1).is_nan());
    }
}
