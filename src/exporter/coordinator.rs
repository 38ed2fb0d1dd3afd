//! Export coordinator for a single collection
//!
//! Drives the pipeline source -> normalize -> sink for one collection and
//! reports what was written. The first error aborts the export and
//! discards any uncommitted output, leaving the destination untouched.

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::Result;

use super::normalize::{FieldRules, normalize_document};
use super::progress::ProgressTracker;
use super::source::DocumentSource;
use super::writer::SnapshotSink;

/// Result of exporting one collection
#[derive(Debug)]
pub struct ExportOutcome {
    /// Collection that was exported
    pub collection: String,
    /// Number of documents exported
    pub documents: u64,
    /// Bytes written to the destination file
    pub file_size_bytes: u64,
    /// Time taken for the export
    pub elapsed_ms: u64,
    /// Field names of the first record, in document order.
    /// `None` when the collection was empty.
    pub sample_fields: Option<Vec<String>>,
}

/// Coordinator for one collection export
///
/// Owns the document source, the normalization rules, and the output sink
/// for the duration of the export.
pub struct CollectionExporter {
    collection: String,
    source: Box<dyn DocumentSource>,
    rules: FieldRules,
    sink: Box<dyn SnapshotSink>,
    tracker: ProgressTracker,
}

impl CollectionExporter {
    /// Create a new exporter
    ///
    /// # Arguments
    /// * `collection` - Collection name, for reporting
    /// * `source` - Document source to drain
    /// * `rules` - Field normalization rules for this collection
    /// * `sink` - Output sink receiving normalized records
    /// * `tracker` - Progress feedback
    pub fn new(
        collection: &str,
        source: Box<dyn DocumentSource>,
        rules: FieldRules,
        sink: Box<dyn SnapshotSink>,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            source,
            rules,
            sink,
            tracker,
        }
    }

    /// Execute the export
    ///
    /// Streams every document from the source through normalization into
    /// the sink, then commits the output. On failure the sink is
    /// discarded and the source closed before the error is returned.
    ///
    /// # Returns
    /// * `Result<ExportOutcome>` - Export statistics or the first error
    pub async fn execute(mut self) -> Result<ExportOutcome> {
        info!("Exporting collection '{}'", self.collection);

        let streamed = self.stream_all().await;
        let committed = match streamed {
            Ok(counts) => self.sink.finalize().await.map(|_| counts),
            Err(e) => Err(e),
        };

        match committed {
            Ok((documents, sample_fields)) => {
                self.source.close().await?;
                self.tracker.finish();

                let outcome = ExportOutcome {
                    collection: self.collection,
                    documents,
                    file_size_bytes: self.sink.bytes_written(),
                    elapsed_ms: self.tracker.elapsed_ms(),
                    sample_fields,
                };
                info!(
                    "Exported {} documents from '{}' in {} ms",
                    outcome.documents, outcome.collection, outcome.elapsed_ms
                );
                Ok(outcome)
            }
            Err(e) => {
                let _ = self.sink.discard().await;
                let _ = self.source.close().await;
                self.tracker.finish();
                Err(e)
            }
        }
    }

    /// Drain the source, returning the document count and the first
    /// record's field names.
    async fn stream_all(&mut self) -> Result<(u64, Option<Vec<String>>)> {
        let mut exported = 0u64;
        let mut sample_fields: Option<Vec<String>> = None;

        while let Some(docs) = self.source.next_batch().await? {
            debug!(
                "Normalizing batch of {} documents from '{}'",
                docs.len(),
                self.collection
            );

            if sample_fields.is_none()
                && let Some(first) = docs.first()
            {
                sample_fields = Some(first.keys().cloned().collect());
            }

            let mut records: Vec<JsonValue> = Vec::with_capacity(docs.len());
            for doc in &docs {
                records.push(normalize_document(doc, &self.rules)?);
            }

            self.sink.write_batch(&records).await?;
            exported += records.len() as u64;
            self.tracker.update(exported);
        }

        Ok((exported, sample_fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::exporter::normalize::FieldRule;
    use crate::exporter::source::VecSource;
    use async_trait::async_trait;
    use mongodb::bson::{doc, oid::ObjectId};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct SinkState {
        records: Vec<JsonValue>,
        finalized: bool,
        discarded: bool,
    }

    // Mock sink recording everything it receives
    struct MockSink {
        state: Arc<Mutex<SinkState>>,
    }

    impl MockSink {
        fn new() -> (Self, Arc<Mutex<SinkState>>) {
            let state = Arc::new(Mutex::new(SinkState::default()));
            (
                Self {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    #[async_trait]
    impl SnapshotSink for MockSink {
        async fn write_batch(&mut self, records: &[JsonValue]) -> Result<usize> {
            self.state.lock().unwrap().records.extend_from_slice(records);
            Ok(records.len())
        }

        async fn finalize(&mut self) -> Result<()> {
            self.state.lock().unwrap().finalized = true;
            Ok(())
        }

        async fn discard(&mut self) -> Result<()> {
            self.state.lock().unwrap().discarded = true;
            Ok(())
        }

        fn bytes_written(&self) -> u64 {
            self.state.lock().unwrap().records.len() as u64 * 100
        }
    }

    fn exporter_with(
        batches: Vec<Vec<mongodb::bson::Document>>,
        rules: FieldRules,
    ) -> (CollectionExporter, Arc<Mutex<SinkState>>) {
        let (sink, state) = MockSink::new();
        let exporter = CollectionExporter::new(
            "lessons",
            Box::new(VecSource::new(batches)),
            rules,
            Box::new(sink),
            ProgressTracker::new("lessons", false),
        );
        (exporter, state)
    }

    #[tokio::test]
    async fn test_export_counts_and_sample_fields() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let batches = vec![
            vec![
                doc! { "_id": id, "subject": "Math", "spaces": 5i32 },
                doc! { "_id": ObjectId::new(), "subject": "Art" },
            ],
            vec![doc! { "_id": ObjectId::new(), "subject": "Music" }],
        ];
        let rules = FieldRules::new().rule("_id", FieldRule::Id);

        let (exporter, state) = exporter_with(batches, rules);
        let outcome = exporter.execute().await.unwrap();

        assert_eq!(outcome.documents, 3);
        assert_eq!(
            outcome.sample_fields,
            Some(vec!["_id".into(), "subject".into(), "spaces".into()])
        );

        let state = state.lock().unwrap();
        assert!(state.finalized);
        assert!(!state.discarded);
        assert_eq!(state.records.len(), 3);
        assert_eq!(state.records[0]["_id"], "507f1f77bcf86cd799439011");
    }

    #[tokio::test]
    async fn test_export_empty_collection() {
        let (exporter, state) = exporter_with(vec![], FieldRules::new());
        let outcome = exporter.execute().await.unwrap();

        assert_eq!(outcome.documents, 0);
        assert_eq!(outcome.sample_fields, None);
        assert!(state.lock().unwrap().finalized);
    }

    #[tokio::test]
    async fn test_normalize_failure_discards_output() {
        let batches = vec![vec![doc! { "price": f64::NAN }]];
        let (exporter, state) = exporter_with(batches, FieldRules::new());

        let err = exporter.execute().await.unwrap_err();
        assert!(matches!(err, ExportError::Normalize(_)));

        let state = state.lock().unwrap();
        assert!(state.discarded);
        assert!(!state.finalized);
    }

    #[tokio::test]
    async fn test_records_keep_batch_order() {
        let batches = vec![
            vec![doc! { "n": 1i32 }, doc! { "n": 2i32 }],
            vec![doc! { "n": 3i32 }],
        ];
        let (exporter, state) = exporter_with(batches, FieldRules::new());
        exporter.execute().await.unwrap();

        let ns: Vec<i64> = state
            .lock()
            .unwrap()
            .records
            .iter()
            .map(|r| r["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }
}
