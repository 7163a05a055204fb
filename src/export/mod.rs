//! Vector store to CSV export.
//!
//! # Submodules
//!
//! - [`csv`] - Field quoting and the vector list literal
//! - [`exporter`] - The export pass itself
//! - [`types`] - Stats, per-record outcomes and pipeline events

pub mod csv;
pub mod exporter;
pub mod types;

pub use exporter::{CSV_HEADER, Exporter, PROGRESS_INTERVAL};
pub use types::{ExportEvent, ExportRow, ExportStats, RecordOutcome, SkipReason};
