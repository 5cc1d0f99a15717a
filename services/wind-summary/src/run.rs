//! One batch run: fetch, summarise, export, render.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use wind_common::{BoundingBox, CrsCode};
use wind_processor::{
    plan_export, ExportRequest, GridGeometry, ScalarField, SummaryExports, WindPipeline,
    ZarrDailySource, ZarrExportSink,
};

use crate::config::RunConfig;

/// Target grid of one export, as checked by `--validate-only`.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedExport {
    pub destination: String,
    pub width: usize,
    pub height: usize,
    pub pixels: u64,
    pub crs: CrsCode,
    pub bbox: BoundingBox,
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub window: String,
    pub days: usize,
    pub exports: SummaryExports,
    pub quicklooks: Vec<PathBuf>,
}

/// Plan both exports over the AOI bounding box without reading any data.
///
/// The actual grid snaps outward to whole source cells, so the real export
/// can be up to one source cell larger in each direction.
pub fn plan_exports(config: &RunConfig) -> Result<Vec<PlannedExport>> {
    let footprint = GridGeometry::new(1, 1, config.aoi.bbox(), CrsCode::Epsg4326);

    [config.export.speed_request(), config.export.sector_request()]
        .into_iter()
        .map(|request| {
            let plan = plan_export(&footprint, request.resolution, request.crs, request.max_pixels)
                .with_context(|| format!("export '{}'", request.destination))?;
            Ok(PlannedExport {
                destination: request.destination,
                width: plan.width,
                height: plan.height,
                pixels: plan.pixels(),
                crs: plan.crs,
                bbox: plan.bbox,
            })
        })
        .collect()
}

/// Run the whole job described by `config`.
#[instrument(skip(config), fields(aoi = config.aoi.name(), window = %config.period))]
pub async fn run(config: &RunConfig) -> Result<RunReport> {
    let source = ZarrDailySource::new(&config.source.root);
    let sink = ZarrExportSink::new(&config.export.root, config.processor.clone());
    let pipeline = WindPipeline::new(config.pipeline_config());

    let summary = pipeline.run(&source).await.context("wind pipeline failed")?;

    let exports = pipeline
        .export(
            &summary,
            &sink,
            &config.export.speed_request(),
            &config.export.sector_request(),
        )
        .await
        .context("export failed")?;

    let mut quicklooks = Vec::new();
    if config.visualization.enabled {
        let root = config.quicklook_root();
        let vis = &config.visualization;
        quicklooks.push(
            write_quicklook(root, &config.export.speed_request(), &summary.median_speed, &vis.speed).await?,
        );
        quicklooks.push(
            write_quicklook(root, &config.export.sector_request(), &summary.dominant_sector, &vis.sector).await?,
        );
    }

    info!(
        days = summary.days,
        speed = %exports.speed.path.display(),
        sector = %exports.sector.path.display(),
        quicklooks = quicklooks.len(),
        "Wind summary run complete"
    );

    Ok(RunReport {
        window: summary.window.to_string(),
        days: summary.days,
        exports,
        quicklooks,
    })
}

/// Render `field` on its native grid to `<root>/<destination>.png`.
async fn write_quicklook(
    root: &Path,
    request: &ExportRequest,
    field: &ScalarField,
    vis: &renderer::VisParams,
) -> Result<PathBuf> {
    let geometry = field.geometry();
    let png = renderer::render_quicklook(field.data(), geometry.width, geometry.height, vis)
        .with_context(|| format!("rendering quicklook for {}", field.name()))?;

    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("creating {:?}", root))?;
    let path = root.join(format!("{}.png", request.destination));
    tokio::fs::write(&path, &png)
        .await
        .with_context(|| format!("writing {:?}", path))?;

    info!(path = %path.display(), bytes = png.len(), "Wrote quicklook");
    Ok(path)
}
