//! Daily grid sources.
//!
//! A source yields one [`FieldSet`] per available day in a date window,
//! each holding the requested variables already cropped to the AOI's
//! bounding box. Days are returned in ascending date order.

mod memory;
mod zarr;

pub use memory::InMemorySource;
pub use zarr::{ZarrDailySource, ZarrFieldAttributes};

use async_trait::async_trait;
use wind_common::{AreaOfInterest, DateWindow};

use crate::error::Result;
use crate::types::FieldSet;

/// What to fetch from a source.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Variables every returned day must contain.
    pub variables: Vec<String>,
    /// Spatial filter; days whose grid misses it are skipped.
    pub aoi: AreaOfInterest,
    /// Temporal filter, `[start, end)`.
    pub window: DateWindow,
}

impl FetchRequest {
    pub fn new(variables: Vec<String>, aoi: AreaOfInterest, window: DateWindow) -> Self {
        Self {
            variables,
            aoi,
            window,
        }
    }
}

/// Provider of daily gridded fields.
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Fetch the days matching `request`, ordered by date.
    ///
    /// An empty result is not an error here; the pipeline decides what an
    /// empty series means. A day that lacks one of the requested variables
    /// fails with `MissingVariable`.
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<FieldSet>>;

    /// Human-readable identifier for logs.
    fn name(&self) -> &str;
}
