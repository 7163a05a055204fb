//! Collection to CSV exporter.
//!
//! One sequential pass: resolve the collection, read everything, check
//! vector lengths, then stream rows to the output file in insertion order.
//! The file is written in place, so an interrupted run leaves a partial
//! file behind.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::{StoredRecord, VectorStore};

use super::csv::{CsvWriter, format_vector_literal};
use super::types::{ExportEvent, ExportRow, ExportStats, RecordOutcome, SkipReason};

/// Header row of the output file.
pub const CSV_HEADER: [&str; 4] = ["phone_id", "brand", "model", "embedding"];

/// Records between progress events.
pub const PROGRESS_INTERVAL: usize = 500;

type EventSink<'a> = Box<dyn FnMut(&ExportEvent) + 'a>;

/// Exports one collection of a [`VectorStore`] to a CSV file.
pub struct Exporter<'a> {
    store: &'a VectorStore,
    collection: String,
    output: PathBuf,
    progress_interval: usize,
    on_event: Option<EventSink<'a>>,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub fn new(store: &'a VectorStore, collection: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            store,
            collection: collection.into(),
            output: output.into(),
            progress_interval: PROGRESS_INTERVAL,
            on_event: None,
        }
    }

    /// Emit a progress event every `interval` processed records.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Receive pipeline events as they happen.
    #[must_use]
    pub fn on_event(mut self, sink: impl FnMut(&ExportEvent) + 'a) -> Self {
        self.on_event = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Run the export.
    ///
    /// An empty collection is not an error: it yields zeroed stats with a
    /// single explanatory entry and leaves the output file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist, the store cannot
    /// be read, or the output file cannot be written.
    pub fn export(&mut self) -> Result<ExportStats> {
        let collection = self.store.get_collection(&self.collection)?;
        let total = self.store.count(&collection)?;
        info!(collection = %collection.name, total, "Collection loaded");
        self.emit(&ExportEvent::CollectionLoaded {
            name: collection.name.clone(),
            total,
        });

        if total == 0 {
            warn!(collection = %collection.name, "No embeddings found in collection");
            return Ok(ExportStats::empty_collection());
        }

        let records = self.store.get_all(&collection)?;
        debug!(count = records.len(), "Fetched records");
        self.emit(&ExportEvent::Fetched {
            count: records.len(),
        });

        let mut stats = ExportStats {
            total_count: total,
            dimensions: distinct_dimensions(&records),
            ..ExportStats::default()
        };
        if stats.has_inconsistent_dimensions() {
            let message = format!(
                "Inconsistent dimensions: {{{}}}",
                stats
                    .dimensions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            warn!("{message}");
            stats.errors.push(message);
        }
        self.emit(&ExportEvent::Validated {
            dimensions: stats.dimensions.clone(),
        });

        self.emit(&ExportEvent::Writing {
            path: self.output.display().to_string(),
        });
        let file = File::create(&self.output)?;
        let mut writer = CsvWriter::new(BufWriter::new(file));
        writer.write_record(&CSV_HEADER)?;

        for (row, record) in records.iter().enumerate() {
            match classify(row, record) {
                RecordOutcome::Row(out) => {
                    writer.write_record(&out.fields())?;
                    stats.exported_count += 1;
                }
                RecordOutcome::Skipped(reason) => {
                    debug!(row, "{reason}");
                    stats.skipped_count += 1;
                    stats.errors.push(reason.to_string());
                }
            }

            let processed = row + 1;
            if processed % self.progress_interval == 0 {
                self.emit(&ExportEvent::Progress { processed, total });
            }
        }
        writer.flush()?;

        info!(
            exported = stats.exported_count,
            skipped = stats.skipped_count,
            total = stats.total_count,
            output = %self.output.display(),
            "Export finished"
        );
        Ok(stats)
    }

    fn emit(&mut self, event: &ExportEvent) {
        if let Some(sink) = self.on_event.as_mut() {
            sink(event);
        }
    }
}

/// Decide what to do with one record. `row` is its zero-based position.
#[must_use]
pub fn classify(row: usize, record: &StoredRecord) -> RecordOutcome {
    // Zero and false count as missing, like an absent or empty id.
    let phone_id = match record.metadata.get("id") {
        Some(id) if id.is_truthy() => id.to_string(),
        _ => return RecordOutcome::Skipped(SkipReason::MissingId { row }),
    };

    match &record.embedding {
        Ok(vector) => RecordOutcome::Row(ExportRow {
            phone_id,
            brand: record.metadata.get_str_or_default("brand"),
            model: record.metadata.get_str_or_default("model"),
            embedding: format_vector_literal(vector),
        }),
        Err(source) => RecordOutcome::Skipped(SkipReason::MalformedVector {
            row,
            source: *source,
        }),
    }
}

fn distinct_dimensions(records: &[StoredRecord]) -> Vec<usize> {
    records
        .iter()
        .filter_map(|r| r.embedding.as_ref().ok().map(Vec::len))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::export::csv::{parse_vector_literal, split_csv_line};
    use crate::store::{Metadata, MetadataValue, NewRecord};
    use tempfile::TempDir;

    fn phone(id: &str, brand: &str, model: &str, embedding: Vec<f32>) -> NewRecord {
        let mut metadata = Metadata::new();
        if !id.is_empty() {
            metadata.insert("id", id);
        }
        metadata.insert("brand", brand);
        metadata.insert("model", model);
        NewRecord {
            id: format!("doc-{id}-{model}"),
            embedding,
            metadata,
            document: Some(format!("{brand} {model}")),
        }
    }

    fn store_with(records: &[NewRecord]) -> VectorStore {
        let mut store = VectorStore::open_memory().unwrap();
        let collection = store.create_collection("phones").unwrap();
        store.add(&collection, records).unwrap();
        store
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(split_csv_line)
            .collect()
    }

    #[test]
    fn test_exports_rows_in_order() {
        let store = store_with(&[
            phone("p1", "Acme", "One", vec![0.5, -0.25]),
            phone("p2", "Globex, Inc", "Two", vec![1.0, 0.0]),
        ]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats.exported_count, 2);
        assert_eq!(stats.skipped_count, 0);
        assert_eq!(stats.total_count, 2);
        assert!(stats.errors.is_empty());
        assert_eq!(stats.dimensions, vec![2]);

        let rows = read_rows(&output);
        assert_eq!(rows[0], CSV_HEADER);
        assert_eq!(rows[1], vec!["p1", "Acme", "One", "[0.5, -0.25]"]);
        assert_eq!(rows[2], vec!["p2", "Globex, Inc", "Two", "[1.0, 0.0]"]);
        assert_eq!(parse_vector_literal(&rows[1][3]).unwrap(), vec![0.5, -0.25]);
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let store = store_with(&[
            phone("p1", "Acme", "One", vec![0.1]),
            phone("", "Acme", "Ghost", vec![0.2]),
            phone("p3", "Acme", "Three", vec![0.3]),
        ]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats.exported_count, 2);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(stats.errors, vec!["Row 1: Missing phone_id".to_string()]);
        assert_eq!(stats.exported_count + stats.skipped_count, stats.total_count);
        assert_eq!(read_rows(&output).len(), 3);
    }

    #[test]
    fn test_zero_and_false_ids_are_skipped() {
        let with_id = |id: MetadataValue| {
            let mut record = phone("", "Acme", "Odd", vec![0.5]);
            record.metadata.insert("id", id);
            record
        };
        let store = store_with(&[
            with_id(MetadataValue::Int(0)),
            with_id(MetadataValue::Float(0.0)),
            with_id(MetadataValue::Bool(false)),
            with_id(MetadataValue::Int(7)),
            with_id(MetadataValue::Bool(true)),
        ]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats.skipped_count, 3);
        assert_eq!(stats.exported_count, 2);
        let ids: Vec<String> = read_rows(&output)[1..].iter().map(|row| row[0].clone()).collect();
        assert_eq!(ids, vec!["7", "True"]);
    }

    #[test]
    fn test_missing_brand_and_model_default_to_empty() {
        let mut record = phone("p1", "x", "y", vec![0.1]);
        record.metadata = Metadata::new().with("id", "p1");
        let store = store_with(&[record]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(read_rows(&output)[1], vec!["p1", "", "", "[0.1]"]);
    }

    #[test]
    fn test_inconsistent_dimensions_do_not_abort() {
        let store = store_with(&[
            phone("p1", "Acme", "One", vec![0.1, 0.2]),
            phone("p2", "Acme", "Two", vec![0.1, 0.2, 0.3]),
        ]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats.exported_count, 2);
        assert_eq!(stats.dimensions, vec![2, 3]);
        assert_eq!(stats.errors, vec!["Inconsistent dimensions: {2, 3}".to_string()]);
    }

    #[test]
    fn test_empty_collection() {
        let store = store_with(&[]);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats, ExportStats::empty_collection());
        assert!(!output.exists());
    }

    #[test]
    fn test_unknown_collection_propagates() {
        let store = store_with(&[]);
        let temp = TempDir::new().unwrap();

        let err = Exporter::new(&store, "tablets", temp.path().join("out.csv"))
            .export()
            .unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound { .. }));
    }

    #[test]
    fn test_progress_events() {
        let records: Vec<NewRecord> = (0..7)
            .map(|i| phone(&format!("p{i}"), "Acme", &format!("M{i}"), vec![0.1]))
            .collect();
        let store = store_with(&records);
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let mut progress = Vec::new();
        Exporter::new(&store, "phones", &output)
            .with_progress_interval(3)
            .on_event(|event| {
                if let ExportEvent::Progress { processed, total } = event {
                    progress.push((*processed, *total));
                }
            })
            .export()
            .unwrap();

        assert_eq!(progress, vec![(3, 7), (6, 7)]);
    }

    #[test]
    fn test_malformed_vector_is_skipped() {
        let store = store_with(&[
            phone("p1", "Acme", "One", vec![0.1]),
            phone("p2", "Acme", "Two", vec![0.2]),
        ]);
        store
            .conn()
            .execute(
                "UPDATE embeddings SET vector = X'010203' WHERE embedding_id = 'doc-p2-Two'",
                [],
            )
            .unwrap();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.csv");

        let stats = Exporter::new(&store, "phones", &output).export().unwrap();

        assert_eq!(stats.exported_count, 1);
        assert_eq!(stats.skipped_count, 1);
        assert!(stats.errors[0].starts_with("Row 1: Malformed vector"));
        assert_eq!(stats.dimensions, vec![1]);
    }
}
