//! Common types shared across the wind climatology crates.

pub mod aoi;
pub mod bbox;
pub mod crs;
pub mod time;

pub use aoi::{AoiError, AreaOfInterest};
pub use bbox::{BboxParseError, BoundingBox};
pub use crs::{CrsCode, CrsParseError};
pub use time::{DateParseError, DateWindow};
