//! Satellite radar: locate main stars P = Q(n) and census the primes P - k
//! within a radius around each of them.
//!
//! The [`pipeline::Pipeline`] drives a run end to end: indices are examined
//! in chunks, every star found is scanned in parallel, and completed records
//! are checkpointed so an interrupted run resumes where it stopped.

pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod scanner;
pub mod tables;

pub use catalog::{Catalog, BUILTIN_QUADRUPLETS};
pub use checkpoint::Checkpoint;
pub use config::{Granularity, IndexSource, RunConfig, ScanWindow};
pub use error::{RadarError, Result};
pub use locator::{LocatorReport, LocatorStats, StarLocator, UndecidedIndex};
pub use pipeline::{Pipeline, RunOutput, StarScan};
pub use scanner::{SatelliteScanner, ScanStats};
pub use tables::{RunReport, RunTables};
