//! Export sinks for summary rasters.

mod zarr;

pub use zarr::{ExportAttributes, ZarrExportSink};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wind_common::{BoundingBox, CrsCode};

use crate::error::{ProcessorError, Result};
use crate::types::ScalarField;

/// Default pixel budget for one export.
pub const DEFAULT_MAX_PIXELS: u64 = 10_000_000_000_000;

/// Where and how to write one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Destination name, unique within a sink (e.g. "Wind_Speed").
    pub destination: String,
    /// Square cell size in units of `crs`.
    pub resolution: f64,
    pub crs: CrsCode,
    pub max_pixels: u64,
}

impl ExportRequest {
    pub fn new(destination: impl Into<String>, resolution: f64, crs: CrsCode) -> Self {
        Self {
            destination: destination.into(),
            resolution,
            crs,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Reject requests no sink could honour.
    pub fn validate(&self) -> Result<()> {
        let name = self.destination.trim();
        if name.is_empty() {
            return Err(ProcessorError::InvalidExport("destination is empty".to_string()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ProcessorError::InvalidExport(format!(
                "destination '{}' must be a plain name",
                self.destination
            )));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ProcessorError::InvalidExport(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        if self.max_pixels == 0 {
            return Err(ProcessorError::InvalidExport("max_pixels must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a completed export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReceipt {
    pub destination: String,
    pub band: String,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub pixels: u64,
    pub bytes_written: u64,
    pub crs: CrsCode,
    pub bbox: BoundingBox,
}

/// Persists a single-band raster.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Resample `field` per `request` and write it.
    ///
    /// Fails with `ExportTooLarge` before writing anything when the target
    /// grid exceeds `request.max_pixels`.
    async fn export(&self, field: &ScalarField, request: &ExportRequest) -> Result<ExportReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_request() {
        assert!(ExportRequest::new("Wind_Speed", 0.1, CrsCode::Epsg4326).validate().is_ok());
        assert!(ExportRequest::new("", 0.1, CrsCode::Epsg4326).validate().is_err());
        assert!(ExportRequest::new("../up", 0.1, CrsCode::Epsg4326).validate().is_err());
        assert!(ExportRequest::new("ok", -1.0, CrsCode::Epsg4326).validate().is_err());
        assert!(ExportRequest::new("ok", 1.0, CrsCode::Epsg4326)
            .with_max_pixels(0)
            .validate()
            .is_err());
    }
}
