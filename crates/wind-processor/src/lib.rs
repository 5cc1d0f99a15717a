//! Wind Climatology Processing over Daily Grids
//!
//! This crate turns a series of daily eastward/northward wind component
//! grids into two summary rasters over an area of interest:
//!
//! - **Median wind speed**: per-cell temporal median of `sqrt(u² + v²)`
//! - **Dominant wind sector**: per-cell most frequent 8-point compass sector
//!   of the direction the wind blows from
//!
//! # Architecture
//!
//! ```text
//! GridSource (Zarr directory / memory)
//!      │   only the AOI's bounding box is read
//!      ▼
//! Vec<FieldSet>  (one per day, ordered by date)
//!      │
//!      ├─► polar:     u, v ─► wind_speed, wind_direction
//!      ├─► clip:      crop + polygon mask
//!      ├─► sector:    wind_direction ─► wind_compass_sector
//!      │
//!      ├─► aggregate: median(wind_speed), mode(wind_compass_sector)
//!      │
//!      ▼
//! WindSummary ─► projection::plan_export ─► ExportSink (Zarr)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wind_processor::{PipelineConfig, WindPipeline, ZarrDailySource};
//!
//! let source = ZarrDailySource::new("/data/era5-land/daily");
//! let pipeline = WindPipeline::new(config);
//! let summary = pipeline.run(&source).await?;
//! ```

pub mod aggregate;
pub mod clip;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod polar;
pub mod projection;
pub mod sector;
pub mod sink;
pub mod source;
pub mod testdata;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{ProcessorConfig, ZarrCompression};
pub use error::{ProcessorError, Result};
pub use pipeline::{PipelineConfig, SummaryExports, WindPipeline, WindSummary};
pub use projection::{plan_export, resample_to_plan, ExportPlan};
pub use sector::CompassSector;
pub use sink::{ExportReceipt, ExportRequest, ExportSink, ZarrExportSink};
pub use source::{FetchRequest, GridSource, InMemorySource, ZarrDailySource};
pub use types::{
    FieldSet, GridGeometry, ScalarField, ValueKind, DOMINANT_WIND_SECTOR, MEDIAN_WIND_SPEED,
    WIND_COMPASS_SECTOR, WIND_DIRECTION, WIND_SPEED,
};
