//! Colorization and quicklook rendering tests.

use renderer::{apply_vis_params, render_quicklook, RenderError, VisParams};

// ============================================================================
// Stretch
// ============================================================================

#[test]
fn test_stretch_endpoints() {
    let vis = VisParams::new(0.0, 10.0, &["#000000", "#ffffff"]);
    let pixels = apply_vis_params(&[-5.0, 0.0, 5.0, 10.0, 99.0], 5, 1, &vis).unwrap();
    let reds: Vec<u8> = pixels.chunks(4).map(|p| p[0]).collect();
    assert_eq!(reds, vec![0, 0, 128, 255, 255]);
    assert!(pixels.chunks(4).all(|p| p[3] == 255));
}

#[test]
fn test_nan_is_transparent() {
    let pixels = apply_vis_params(&[f32::NAN, 3.0], 2, 1, &VisParams::wind_speed()).unwrap();
    assert_eq!(&pixels[0..4], &[0, 0, 0, 0]);
    assert_eq!(pixels[7], 255);
}

#[test]
fn test_sector_palette_maps_each_class() {
    let vis = VisParams::wind_sector();
    let classes: Vec<f32> = (0..8).map(|s| s as f32).collect();
    let pixels = apply_vis_params(&classes, 8, 1, &vis).unwrap();

    for (sector, px) in pixels.chunks(4).enumerate() {
        let (r, g, b) = renderer::hex_to_rgb(&vis.palette[sector]).unwrap();
        assert_eq!(&px[0..3], &[r, g, b], "sector {}", sector);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_size_mismatch() {
    let err = render_quicklook(&[1.0; 3], 2, 2, &VisParams::wind_speed()).unwrap_err();
    assert!(matches!(err, RenderError::SizeMismatch { len: 3, .. }));
}

#[test]
fn test_invalid_palette() {
    let vis = VisParams::new(0.0, 1.0, &["#12345"]);
    assert!(matches!(
        render_quicklook(&[0.5], 1, 1, &vis),
        Err(RenderError::InvalidColor(_))
    ));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_vis_params_from_json() {
    let vis: VisParams =
        serde_json::from_str(r##"{"min": 0, "max": 7, "palette": ["#ff0000", "#0000ff"]}"##).unwrap();
    assert_eq!(vis.max, 7.0);
    let png = render_quicklook(&[0.0, 7.0, f32::NAN, 3.5], 2, 2, &vis).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}
