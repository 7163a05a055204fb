//! Export result types.

use serde::Serialize;
use std::fmt;

use crate::store::MalformedVector;

/// Statistics for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Rows written to the output file.
    pub exported_count: usize,
    /// Records left out of the output.
    pub skipped_count: usize,
    /// Records in the source collection.
    pub total_count: usize,
    /// Every problem seen, in order. Skipped records contribute one entry each.
    pub errors: Vec<String>,
    /// Distinct vector lengths observed, ascending.
    pub dimensions: Vec<usize>,
}

impl ExportStats {
    /// Result for a collection with no records.
    #[must_use]
    pub fn empty_collection() -> Self {
        Self {
            errors: vec!["No embeddings found".to_string()],
            ..Self::default()
        }
    }

    /// True if at least one row was exported.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exported_count > 0
    }

    /// Process exit status for this result: 0 iff anything was exported.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// True if the source vectors did not all have the same length.
    #[must_use]
    pub fn has_inconsistent_dimensions(&self) -> bool {
        self.dimensions.len() > 1
    }

    /// The first `limit` errors and how many were left out.
    #[must_use]
    pub fn error_preview(&self, limit: usize) -> (&[String], usize) {
        let shown = self.errors.len().min(limit);
        (&self.errors[..shown], self.errors.len() - shown)
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub phone_id: String,
    pub brand: String,
    pub model: String,
    /// Vector rendered as a list literal.
    pub embedding: String,
}

impl ExportRow {
    #[must_use]
    pub fn fields(&self) -> [&str; 4] {
        [&self.phone_id, &self.brand, &self.model, &self.embedding]
    }
}

/// Why a record was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingId { row: usize },
    MalformedVector { row: usize, source: MalformedVector },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId { row } => write!(f, "Row {row}: Missing phone_id"),
            Self::MalformedVector { row, source } => write!(f, "Row {row}: {source}"),
        }
    }
}

/// What happened to one source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Row(ExportRow),
    Skipped(SkipReason),
}

/// Pipeline milestones, reported to the caller as they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// The collection was resolved and counted.
    CollectionLoaded { name: String, total: usize },
    /// All records were read.
    Fetched { count: usize },
    /// Vector lengths were checked.
    Validated { dimensions: Vec<usize> },
    /// Writing the output file started.
    Writing { path: String },
    /// Periodic progress while writing.
    Progress { processed: usize, total: usize },
}
