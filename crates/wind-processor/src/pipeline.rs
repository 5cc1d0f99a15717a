//! The wind summary pipeline.
//!
//! ```text
//! GridSource::fetch(u, v, AOI, window)
//!      │
//!      ▼
//! per day (parallel):  derive speed/direction ─► clip to AOI ─► classify sector
//!      │
//!      ▼
//! per cell:  median(wind_speed)          mode(wind_compass_sector)
//!      │                                        │
//!      └──────────── clip to AOI ───────────────┘
//!                        │
//!                        ▼
//!                  ExportSink::export
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};
use wind_common::{AreaOfInterest, DateWindow};

use crate::aggregate::{collect_band, median_field, mode_field};
use crate::clip::{clip, clip_set};
use crate::error::{ProcessorError, Result};
use crate::polar::add_polar_bands;
use crate::projection::plan_export;
use crate::sector::add_sector_band;
use crate::sink::{ExportReceipt, ExportRequest, ExportSink};
use crate::source::{FetchRequest, GridSource};
use crate::types::{
    FieldSet, ScalarField, DOMINANT_WIND_SECTOR, MEDIAN_WIND_SPEED, WIND_COMPASS_SECTOR,
    WIND_SPEED,
};

/// Inputs of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub aoi: AreaOfInterest,
    pub window: DateWindow,
    /// Eastward wind component variable.
    pub u_variable: String,
    /// Northward wind component variable.
    pub v_variable: String,
}

/// Summary rasters for one AOI and window.
#[derive(Debug, Clone)]
pub struct WindSummary {
    pub median_speed: ScalarField,
    pub dominant_sector: ScalarField,
    pub window: DateWindow,
    /// Days that contributed to the aggregates.
    pub days: usize,
}

/// Exports of a summary, one per band.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryExports {
    pub speed: ExportReceipt,
    pub sector: ExportReceipt,
}

pub struct WindPipeline {
    config: PipelineConfig,
}

impl WindPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The fetch this pipeline issues against its source.
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest::new(
            vec![self.config.u_variable.clone(), self.config.v_variable.clone()],
            self.config.aoi.clone(),
            self.config.window,
        )
    }

    /// Fetch the window from `source` and summarise it.
    #[instrument(skip(self, source), fields(source = source.name(), aoi = self.config.aoi.name()))]
    pub async fn run<S>(&self, source: &S) -> Result<WindSummary>
    where
        S: GridSource + ?Sized,
    {
        let start = Instant::now();
        let series = source.fetch(&self.fetch_request()).await?;
        let summary = self.summarize(series)?;

        let elapsed = start.elapsed();
        metrics::histogram!("wind_pipeline_duration_seconds").record(elapsed.as_secs_f64());
        info!(
            days = summary.days,
            window = %summary.window,
            elapsed_ms = elapsed.as_millis() as u64,
            "Wind summary computed"
        );
        Ok(summary)
    }

    /// Summarise an already fetched series.
    ///
    /// Days outside the window are dropped, the remaining order is kept.
    pub fn summarize(&self, series: Vec<FieldSet>) -> Result<WindSummary> {
        let window = self.config.window;
        let series: Vec<FieldSet> = series
            .into_iter()
            .filter(|day| window.contains(day.date()))
            .collect();

        if series.is_empty() {
            return Err(ProcessorError::EmptySeries {
                window: window.to_string(),
            });
        }

        let derived = series
            .par_iter()
            .map(|day| self.derive_day(day))
            .collect::<Result<Vec<_>>>()?;

        let speeds = collect_band(&derived, WIND_SPEED)?;
        let sectors = collect_band(&derived, WIND_COMPASS_SECTOR)?;

        let cells = speeds[0].geometry().len();
        debug!(days = derived.len(), cells, "Aggregating series");

        let median_speed = clip(&median_field(&speeds, MEDIAN_WIND_SPEED)?, &self.config.aoi)?;
        let dominant_sector = clip(&mode_field(&sectors, DOMINANT_WIND_SECTOR)?, &self.config.aoi)?;

        metrics::counter!("wind_days_processed_total").increment(derived.len() as u64);
        metrics::counter!("wind_cells_aggregated_total").increment((cells * derived.len()) as u64);

        Ok(WindSummary {
            median_speed,
            dominant_sector,
            window,
            days: derived.len(),
        })
    }

    /// Derive speed, direction and sector for one day, clipped to the AOI.
    fn derive_day(&self, day: &FieldSet) -> Result<FieldSet> {
        let polar = add_polar_bands(day, &self.config.u_variable, &self.config.v_variable)?;
        let clipped = clip_set(&polar, &self.config.aoi)?;
        add_sector_band(&clipped)
    }

    /// Export both summary bands.
    ///
    /// Both requests are validated and planned before either band is
    /// written, so a rejected request leaves the sink untouched.
    pub async fn export<K>(
        &self,
        summary: &WindSummary,
        sink: &K,
        speed: &ExportRequest,
        sector: &ExportRequest,
    ) -> Result<SummaryExports>
    where
        K: ExportSink + ?Sized,
    {
        for (field, request) in [(&summary.median_speed, speed), (&summary.dominant_sector, sector)] {
            request.validate()?;
            plan_export(field.geometry(), request.resolution, request.crs, request.max_pixels)?;
        }

        let speed = sink.export(&summary.median_speed, speed).await?;
        let sector = sink.export(&summary.dominant_sector, sector).await?;
        Ok(SummaryExports { speed, sector })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::uniform_wind_day;
    use crate::types::GridGeometry;
    use chrono::NaiveDate;
    use wind_common::{BoundingBox, CrsCode};

    fn pipeline() -> WindPipeline {
        WindPipeline::new(PipelineConfig {
            aoi: AreaOfInterest::from_bbox("box", &BoundingBox::new(0.0, 0.0, 2.0, 2.0)).unwrap(),
            window: DateWindow::parse("2024-06-01", "2024-06-04").unwrap(),
            u_variable: "u".to_string(),
            v_variable: "v".to_string(),
        })
    }

    fn geometry() -> GridGeometry {
        GridGeometry::new(2, 2, BoundingBox::new(0.0, 0.0, 2.0, 2.0), CrsCode::Epsg4326)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_empty_series() {
        let err = pipeline().summarize(Vec::new()).unwrap_err();
        assert!(matches!(err, ProcessorError::EmptySeries { .. }));
    }

    #[test]
    fn test_days_outside_window_are_dropped() {
        let days = vec![uniform_wind_day(date(20), geometry(), "u", "v", 1.0, 0.0).unwrap()];
        assert!(matches!(
            pipeline().summarize(days),
            Err(ProcessorError::EmptySeries { .. })
        ));
    }

    #[test]
    fn test_single_day() {
        // Flow toward the north: 5 m/s from the south.
        let days = vec![uniform_wind_day(date(1), geometry(), "u", "v", 0.0, 5.0).unwrap()];
        let summary = pipeline().summarize(days).unwrap();
        assert_eq!(summary.days, 1);
        assert!(summary.median_speed.data().iter().all(|&v| v == 5.0));
        assert!(summary.dominant_sector.data().iter().all(|&v| v == 4.0));
        assert_eq!(summary.dominant_sector.name(), DOMINANT_WIND_SECTOR);
    }

    #[test]
    fn test_two_of_three_days_set_the_sector() {
        // Flow toward the north, the east, then the north again at 5 m/s.
        // Sectors record where the wind comes from, so the northward days
        // are southerly winds.
        let days = vec![
            uniform_wind_day(date(1), geometry(), "u", "v", 0.0, 5.0).unwrap(),
            uniform_wind_day(date(2), geometry(), "u", "v", 5.0, 0.0).unwrap(),
            uniform_wind_day(date(3), geometry(), "u", "v", 0.0, 5.0).unwrap(),
        ];
        let summary = pipeline().summarize(days).unwrap();
        assert_eq!(summary.days, 3);
        assert_eq!(summary.median_speed.data(), &[5.0; 4]);
        assert_eq!(summary.dominant_sector.data(), &[4.0; 4]);
    }

    #[test]
    fn test_run_against_memory_source() {
        use crate::source::InMemorySource;

        let source = InMemorySource::new(vec![
            uniform_wind_day(date(2), geometry(), "u", "v", -3.0, 0.0).unwrap(),
            uniform_wind_day(date(1), geometry(), "u", "v", -1.0, 0.0).unwrap(),
        ]);
        let summary = tokio_test::block_on(pipeline().run(&source)).unwrap();
        assert_eq!(summary.days, 2);
        assert!(summary.median_speed.data().iter().all(|&v| v == 2.0));
        // Blowing toward the west: from the east.
        assert!(summary.dominant_sector.data().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_missing_component_fails() {
        let day = FieldSet::new(date(1));
        assert!(matches!(
            pipeline().summarize(vec![day]),
            Err(ProcessorError::MissingVariable { .. })
        ));
    }
}
