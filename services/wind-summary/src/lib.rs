//! Wind summary batch job.
//!
//! Loads a [`RunConfig`], runs the wind pipeline against a daily Zarr
//! directory, exports both summary bands and optionally writes PNG
//! quicklooks next to them.

pub mod config;
pub mod run;

pub use config::RunConfig;
pub use run::{plan_exports, run, PlannedExport, RunReport};
