//! Core of the AIS spoofing detector.
//!
//! A record table is partitioned into per-vessel tracks, each track is turned
//! into consecutive-fix deltas and classified on a fixed worker pool, and the
//! flagged rows are merged back into one table.

pub mod ais;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{AnomalyClassifier, DetectionError, DetectionResult, DetectorConfig};
