//! Deserialization of the shared definition types from YAML run files.

use chrono::NaiveDate;
use wind_common::{AreaOfInterest, CrsCode, DateWindow};

#[derive(serde::Deserialize)]
struct Run {
    aoi: AreaOfInterest,
    period: DateWindow,
    crs: CrsCode,
}

#[test]
fn test_yaml_run_definition() {
    let yaml = r#"
aoi:
  name: british-isles
  coordinates:
    - [-11.11936435768948, 61.041472818639726]
    - [-11.11936435768948, 49.70202021677499]
    - [2.3279012673105193, 49.70202021677499]
    - [2.3279012673105193, 61.041472818639726]
period:
  start: "2024-06-01"
  end: "2024-09-01"
crs: EPSG:4326
"#;

    let run: Run = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(run.aoi.name(), "british-isles");
    assert_eq!(run.aoi.ring().len(), 5);
    assert!(run.aoi.contains_point(-3.2, 55.9));
    assert!(!run.aoi.contains_point(5.0, 55.9));
    assert_eq!(run.period.start(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(run.crs, CrsCode::Epsg4326);
}

#[test]
fn test_yaml_rejects_invalid_window() {
    let yaml = r#"
aoi:
  coordinates: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]
period:
  start: "2024-09-01"
  end: "2024-06-01"
crs: EPSG:4326
"#;
    assert!(serde_yaml::from_str::<Run>(yaml).is_err());
}

#[test]
fn test_yaml_aoi_default_name() {
    let yaml = r#"
aoi:
  coordinates: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]
period:
  start: "2024-06-01"
  end: "2024-06-02"
crs: EPSG:3857
"#;
    let run: Run = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(run.aoi.name(), "aoi");
    assert_eq!(run.crs, CrsCode::Epsg3857);
}
