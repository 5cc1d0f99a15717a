//! Zarr V3 export sink.
//!
//! Each export becomes `<root>/<destination>.zarr`, a single 2-D array.
//! Continuous bands are stored as `float32` with NaN fill, categorical bands
//! as `uint8` with fill 255.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use wind_common::CrsCode;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use super::{ExportReceipt, ExportRequest, ExportSink};
use crate::config::{ProcessorConfig, ZarrCompression};
use crate::error::{ProcessorError, Result};
use crate::projection::{plan_export, resample_to_plan};
use crate::types::{ScalarField, ValueKind};

/// No-data value for categorical exports.
pub const CATEGORICAL_NODATA: u8 = 255;

/// Attributes written on every exported array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAttributes {
    pub band: String,
    pub units: String,
    pub kind: ValueKind,
    pub crs: CrsCode,
    pub resolution: f64,
    pub bbox: [f64; 4],
    /// Missing-value marker; `None` for NaN.
    pub nodata: Option<u8>,
    pub created: String,
}

impl ExportAttributes {
    /// Read the attributes back from an exported array.
    pub fn read(path: &Path) -> Result<Self> {
        let store = FilesystemStore::new(path)
            .map_err(|e| ProcessorError::storage_error(format!("{}: {}", path.display(), e)))?;
        let array = Array::open(Arc::new(store), "/")
            .map_err(|e| ProcessorError::zarr_error(format!("{}: {}", path.display(), e)))?;
        serde_json::from_value(serde_json::Value::Object(array.attributes().clone()))
            .map_err(|e| ProcessorError::invalid_metadata(e.to_string()))
    }
}

/// Writes exports as Zarr arrays under a root directory.
#[derive(Debug, Clone)]
pub struct ZarrExportSink {
    root: PathBuf,
    config: ProcessorConfig,
}

impl ZarrExportSink {
    pub fn new(root: impl Into<PathBuf>, config: ProcessorConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `destination` is written.
    pub fn destination_path(&self, destination: &str) -> PathBuf {
        self.root.join(format!("{}.zarr", destination))
    }

    /// Write into a staging sibling, then swap it into place.
    ///
    /// A failed write removes the staging copy and leaves any previous
    /// export at `path` intact.
    fn write(
        config: &ProcessorConfig,
        path: &Path,
        field: &ScalarField,
        attrs: &ExportAttributes,
    ) -> Result<u64> {
        let staging = sibling(path, "partial");
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }

        let bytes_written = match Self::write_array(config, &staging, field, attrs) {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                    debug!(path = %staging.display(), error = %cleanup, "Failed to remove staging export");
                }
                return Err(e);
            }
        };

        if path.exists() {
            debug!(path = %path.display(), "Replacing existing export");
            let previous = sibling(path, "previous");
            if previous.exists() {
                std::fs::remove_dir_all(&previous)?;
            }
            std::fs::rename(path, &previous)?;
            std::fs::rename(&staging, path)?;
            std::fs::remove_dir_all(&previous)?;
        } else {
            std::fs::rename(&staging, path)?;
        }

        Ok(bytes_written)
    }

    fn write_array(
        config: &ProcessorConfig,
        path: &Path,
        field: &ScalarField,
        attrs: &ExportAttributes,
    ) -> Result<u64> {
        std::fs::create_dir_all(path)?;

        let store = Arc::new(
            FilesystemStore::new(path)
                .map_err(|e| ProcessorError::storage_error(format!("{}: {}", path.display(), e)))?,
        );

        let geometry = field.geometry();
        let (width, height) = (geometry.width, geometry.height);
        let chunk_size = config.zarr_chunk_size.min(width.max(height)).max(1);

        let (data_type, fill_value, typesize) = match field.kind() {
            ValueKind::Continuous => (DataType::Float32, FillValue::from(f32::NAN), 4),
            ValueKind::Categorical => (DataType::UInt8, FillValue::from(CATEGORICAL_NODATA), 1),
        };

        let chunk_grid: zarrs::array::ChunkGrid = vec![chunk_size as u64, chunk_size as u64]
            .try_into()
            .map_err(|e| ProcessorError::ConfigError(format!("{:?}", e)))?;

        let attributes = match serde_json::to_value(attrs)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        let mut binding = ArrayBuilder::new(
            vec![height as u64, width as u64], // shape [rows, cols]
            data_type,
            chunk_grid,
            fill_value,
        );
        let mut builder = binding.attributes(attributes);

        if config.zarr_compression != ZarrCompression::None {
            let codec = create_compression_codec(config, typesize)?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let array = builder
            .build(store, "/")
            .map_err(|e| ProcessorError::storage_error(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| ProcessorError::storage_error(e.to_string()))?;

        let subset =
            ArraySubset::new_with_start_shape(vec![0, 0], vec![height as u64, width as u64])
                .map_err(|e| ProcessorError::storage_error(e.to_string()))?;

        let bytes_written = match field.kind() {
            ValueKind::Continuous => {
                array
                    .store_array_subset_elements::<f32>(&subset, field.data())
                    .map_err(|e| ProcessorError::storage_error(e.to_string()))?;
                (field.data().len() * std::mem::size_of::<f32>()) as u64
            }
            ValueKind::Categorical => {
                let classes = to_classes(field.data());
                array
                    .store_array_subset_elements::<u8>(&subset, classes.as_slice())
                    .map_err(|e| ProcessorError::storage_error(e.to_string()))?;
                classes.len() as u64
            }
        };

        Ok(bytes_written)
    }
}

/// Hidden sibling of `path` such as `.Wind_Speed.zarr.partial`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}", name, suffix))
}

/// Categorical values as class bytes; missing cells become [`CATEGORICAL_NODATA`].
fn to_classes(data: &[f32]) -> Vec<u8> {
    data.iter()
        .map(|&v| {
            if v.is_nan() || v < 0.0 || v >= f32::from(CATEGORICAL_NODATA) {
                CATEGORICAL_NODATA
            } else {
                v as u8
            }
        })
        .collect()
}

fn create_compression_codec(
    config: &ProcessorConfig,
    typesize: usize,
) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(config.zarr_compression_level)
        .map_err(|_| ProcessorError::ConfigError("Invalid compression level".to_string()))?;

    let shuffle = if config.zarr_shuffle {
        BloscShuffleMode::Shuffle
    } else {
        BloscShuffleMode::NoShuffle
    };

    // typesize is required when shuffle is enabled
    let typesize = config.zarr_shuffle.then_some(typesize);

    let compressor = match config.zarr_compression {
        ZarrCompression::None => {
            return Err(ProcessorError::ConfigError(
                "No compression configured".to_string(),
            ))
        }
        ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
        ZarrCompression::BloscZstd => BloscCompressor::Zstd,
    };

    let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
        .map_err(|e| ProcessorError::ConfigError(e.to_string()))?;

    Ok(Arc::new(codec))
}

#[async_trait]
impl ExportSink for ZarrExportSink {
    async fn export(&self, field: &ScalarField, request: &ExportRequest) -> Result<ExportReceipt> {
        request.validate()?;

        let plan = plan_export(field.geometry(), request.resolution, request.crs, request.max_pixels)?;
        let resampled = resample_to_plan(field, &plan)?;

        let attrs = ExportAttributes {
            band: field.name().to_string(),
            units: field.units().to_string(),
            kind: field.kind(),
            crs: plan.crs,
            resolution: plan.resolution,
            bbox: plan.bbox.to_array(),
            nodata: match field.kind() {
                ValueKind::Categorical => Some(CATEGORICAL_NODATA),
                ValueKind::Continuous => None,
            },
            created: Utc::now().to_rfc3339(),
        };

        let path = self.destination_path(&request.destination);
        let config = self.config.clone();
        let write_path = path.clone();
        let bytes_written = tokio::task::spawn_blocking(move || {
            Self::write(&config, &write_path, &resampled, &attrs)
        })
        .await
        .map_err(|e| ProcessorError::storage_error(format!("writer task failed: {}", e)))??;

        metrics::counter!("wind_export_pixels_total").increment(plan.pixels());

        info!(
            band = field.name(),
            destination = %request.destination,
            path = %path.display(),
            width = plan.width,
            height = plan.height,
            crs = %plan.crs,
            bytes = bytes_written,
            "Export written"
        );

        Ok(ExportReceipt {
            destination: request.destination.clone(),
            band: field.name().to_string(),
            path,
            width: plan.width,
            height: plan.height,
            pixels: plan.pixels(),
            bytes_written,
            crs: plan.crs,
            bbox: plan.bbox,
        })
    }
}
