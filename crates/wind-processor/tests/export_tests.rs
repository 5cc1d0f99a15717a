//! Export sink behaviour: pixel budget, CRS handling and overwrites.

use chrono::NaiveDate;
use wind_common::{AreaOfInterest, BoundingBox, CrsCode, DateWindow};
use wind_processor::sink::ExportAttributes;
use wind_processor::testdata::uniform_wind_day;
use wind_processor::{
    plan_export, ExportRequest, ExportSink, GridGeometry, PipelineConfig, ProcessorConfig,
    ProcessorError, ScalarField, ValueKind, WindPipeline, ZarrCompression, ZarrExportSink,
};

fn speed_field() -> ScalarField {
    let geometry = GridGeometry::new(4, 3, BoundingBox::new(-4.0, 50.0, 0.0, 53.0), CrsCode::Epsg4326);
    let data = (0..12).map(|i| i as f32 * 0.5).collect();
    ScalarField::new("median_wind_speed", "m s-1", ValueKind::Continuous, geometry, data).unwrap()
}

#[tokio::test]
async fn test_budget_exceeded_writes_nothing() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = ZarrExportSink::new(temp_dir.path(), ProcessorConfig::default());
    let request = ExportRequest::new("Wind_Speed", 0.01, CrsCode::Epsg4326).with_max_pixels(1_000);

    let err = sink.export(&speed_field(), &request).await.unwrap_err();
    match err {
        ProcessorError::ExportTooLarge { pixels, max_pixels } => {
            assert_eq!(pixels, 400 * 300);
            assert_eq!(max_pixels, 1_000);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!sink.destination_path("Wind_Speed").exists());
}

#[tokio::test]
async fn test_invalid_request_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = ZarrExportSink::new(temp_dir.path(), ProcessorConfig::default());
    let request = ExportRequest::new("nested/name", 1.0, CrsCode::Epsg4326);
    assert!(matches!(
        sink.export(&speed_field(), &request).await,
        Err(ProcessorError::InvalidExport(_))
    ));
}

#[tokio::test]
async fn test_mercator_export() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ProcessorConfig {
        zarr_compression: ZarrCompression::None,
        ..ProcessorConfig::default()
    };
    let sink = ZarrExportSink::new(temp_dir.path(), config);
    let request = ExportRequest::new("Wind_Speed_3857", 50_000.0, CrsCode::Epsg3857);

    let receipt = sink.export(&speed_field(), &request).await.unwrap();
    let plan = plan_export(speed_field().geometry(), 50_000.0, CrsCode::Epsg3857, u64::MAX).unwrap();

    assert_eq!(receipt.crs, CrsCode::Epsg3857);
    assert_eq!((receipt.width, receipt.height), (plan.width, plan.height));
    assert_eq!(receipt.bbox, plan.bbox);

    let attrs = ExportAttributes::read(&receipt.path).unwrap();
    assert_eq!(attrs.crs, CrsCode::Epsg3857);
    assert_eq!(attrs.resolution, 50_000.0);
    assert_eq!(attrs.kind, ValueKind::Continuous);
    assert!(attrs.nodata.is_none());
}

#[tokio::test]
async fn test_export_overwrites_destination() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = ZarrExportSink::new(temp_dir.path(), ProcessorConfig::default());

    let coarse = ExportRequest::new("Wind_Speed", 1.0, CrsCode::Epsg4326);
    let fine = ExportRequest::new("Wind_Speed", 0.5, CrsCode::Epsg4326);

    sink.export(&speed_field(), &coarse).await.unwrap();
    let receipt = sink.export(&speed_field(), &fine).await.unwrap();

    assert_eq!((receipt.width, receipt.height), (8, 6));
    let attrs = ExportAttributes::read(&receipt.path).unwrap();
    assert_eq!(attrs.resolution, 0.5);
}

#[tokio::test]
async fn test_rejected_sector_request_writes_neither_band() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sink = ZarrExportSink::new(temp_dir.path(), ProcessorConfig::default());

    let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
    let pipeline = WindPipeline::new(PipelineConfig {
        aoi: AreaOfInterest::from_bbox("square", &bbox).unwrap(),
        window: DateWindow::parse("2024-06-01", "2024-06-02").unwrap(),
        u_variable: "u".to_string(),
        v_variable: "v".to_string(),
    });
    let geometry = GridGeometry::new(2, 2, bbox, CrsCode::Epsg4326);
    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let summary = pipeline
        .summarize(vec![uniform_wind_day(day, geometry, "u", "v", 0.0, -5.0).unwrap()])
        .unwrap();

    let speed = ExportRequest::new("Wind_Speed", 1.0, CrsCode::Epsg4326);
    let sector = ExportRequest::new("Wind_Sector", 0.001, CrsCode::Epsg4326).with_max_pixels(10);

    let err = pipeline.export(&summary, &sink, &speed, &sector).await.unwrap_err();
    assert!(matches!(err, ProcessorError::ExportTooLarge { max_pixels: 10, .. }));
    assert!(!sink.destination_path("Wind_Speed").exists());
    assert!(!sink.destination_path("Wind_Sector").exists());
}

#[tokio::test]
async fn test_failed_overwrite_keeps_previous_export() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let request = ExportRequest::new("Wind_Speed", 1.0, CrsCode::Epsg4326);

    let sink = ZarrExportSink::new(temp_dir.path(), ProcessorConfig::default());
    let first = sink.export(&speed_field(), &request).await.unwrap();

    // Blosc levels stop at 9, so this sink fails while building the array.
    let broken = ZarrExportSink::new(
        temp_dir.path(),
        ProcessorConfig {
            zarr_compression_level: 12,
            ..ProcessorConfig::default()
        },
    );
    let finer = ExportRequest::new("Wind_Speed", 0.5, CrsCode::Epsg4326);
    assert!(matches!(
        broken.export(&speed_field(), &finer).await,
        Err(ProcessorError::ConfigError(_))
    ));

    let attrs = ExportAttributes::read(&first.path).unwrap();
    assert_eq!(attrs.resolution, 1.0);
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("Wind_Speed.zarr")]);
}
