//! Collection export pipeline
//!
//! A snapshot export of one collection is built from three pieces:
//!
//! 1. **DocumentSource**: streams every document of the collection in
//!    batches (unfiltered, no limit)
//! 2. **normalize**: converts BSON field types to their JSON-native forms
//!    per collection rules
//! 3. **SnapshotSink**: streams the normalized records into a
//!    pretty-printed JSON array, committed atomically
//!
//! The **CollectionExporter** orchestrates the pipeline and reports an
//! [`ExportOutcome`] per collection.

pub mod coordinator;
pub mod normalize;
pub mod progress;
pub mod source;
pub mod writer;

pub use coordinator::{CollectionExporter, ExportOutcome};
pub use normalize::{FieldRule, FieldRules, normalize_document};
pub use progress::ProgressTracker;
pub use source::{CursorSource, DocumentSource, VecSource};
pub use writer::{JsonArrayWriter, SnapshotSink};
