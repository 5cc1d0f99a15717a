//! Error types for the wind processing pipeline.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while fetching, deriving, aggregating or exporting fields.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// The grid source could not be reached or listed.
    #[error("grid source unavailable: {0}")]
    SourceUnavailable(String),

    /// No daily fields remained for the requested window.
    #[error("no daily fields available for window {window}")]
    EmptySeries { window: String },

    /// A requested variable is absent for one day.
    #[error("variable '{variable}' is missing for {date}")]
    MissingVariable { variable: String, date: NaiveDate },

    /// Fields that must be co-registered are not.
    #[error("grid geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// A band name was added twice to the same field set.
    #[error("band '{0}' already present in field set")]
    DuplicateBand(String),

    /// The AOI does not overlap the grid.
    #[error("AOI {aoi} is outside grid bounds {grid}")]
    OutOfBounds { aoi: String, grid: String },

    /// The export would exceed the configured pixel budget.
    #[error("export of {pixels} pixels exceeds the budget of {max_pixels} pixels")]
    ExportTooLarge { pixels: u64, max_pixels: u64 },

    /// The export request itself is malformed.
    #[error("invalid export request: {0}")]
    InvalidExport(String),

    /// Invalid metadata in a stored grid.
    #[error("invalid grid metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ProcessorError {
    /// Create a SourceUnavailable error.
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a GeometryMismatch error.
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

impl From<std::io::Error> for ProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for processor operations.
pub type Result<T> = std::result::Result<T, ProcessorError>;
