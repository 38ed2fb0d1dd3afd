//! Document source abstractions for export operations
//!
//! This module provides a batch-oriented interface for reading every
//! document in a collection without loading the full result set through
//! a single driver call, plus the cursor-backed implementation used for
//! real exports.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Cursor;
use mongodb::bson::{Document, doc};
use tracing::debug;

use crate::error::Result;

/// Trait for streaming collection contents in batches
///
/// Test code substitutes in-memory implementations; production code uses
/// [`CursorSource`].
#[async_trait]
pub trait DocumentSource: Send {
    /// Fetch the next batch of documents
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - Next batch, or None if exhausted
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>>;

    /// Close the source and release resources
    async fn close(&mut self) -> Result<()>;
}

/// Cursor-backed document source
///
/// Wraps a driver cursor from an unfiltered find over one collection.
pub struct CursorSource {
    cursor: Option<Cursor<Document>>,
    batch_size: u32,
    total_fetched: u64,
    collection: String,
    closed: bool,
}

impl CursorSource {
    /// Create a source over an existing cursor.
    ///
    /// # Arguments
    /// * `cursor` - MongoDB cursor from a find operation
    /// * `batch_size` - Number of documents to yield per batch
    /// * `collection` - Collection name, for logging
    pub fn new(cursor: Cursor<Document>, batch_size: u32, collection: &str) -> Self {
        Self {
            cursor: Some(cursor),
            batch_size: batch_size.max(1),
            total_fetched: 0,
            collection: collection.to_string(),
            closed: false,
        }
    }

    /// Open a source over every document in a collection.
    ///
    /// No filter and no limit; ordering is whatever the store returns
    /// unless `stable_order` sorts by `_id` ascending.
    ///
    /// # Arguments
    /// * `database` - Open database handle
    /// * `collection` - Collection to read
    /// * `batch_size` - Documents per batch
    /// * `stable_order` - Sort by `_id` ascending for reproducible output
    pub async fn open(
        database: &mongodb::Database,
        collection: &str,
        batch_size: u32,
        stable_order: bool,
    ) -> Result<Self> {
        let coll = database.collection::<Document>(collection);

        let mut find = coll.find(doc! {}).batch_size(batch_size);
        if stable_order {
            find = find.sort(doc! { "_id": 1 });
        }
        let cursor = find.await?;

        debug!("Opened cursor over collection '{collection}'");
        Ok(Self::new(cursor, batch_size, collection))
    }
}

#[async_trait]
impl DocumentSource for CursorSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        if self.closed {
            return Ok(None);
        }

        let cursor = match self.cursor.as_mut() {
            Some(c) => c,
            None => return Ok(None),
        };

        let mut batch = Vec::with_capacity(self.batch_size as usize);

        for _ in 0..self.batch_size {
            match cursor.try_next().await {
                Ok(Some(doc)) => batch.push(doc),
                Ok(None) => break,
                Err(e) => {
                    // On error, drop the cursor to release server resources
                    self.cursor = None;
                    self.closed = true;
                    return Err(e.into());
                }
            }
        }

        if batch.is_empty() {
            debug!(
                "Collection '{}' exhausted after {} documents",
                self.collection, self.total_fetched
            );
            self.cursor = None;
            self.closed = true;
            Ok(None)
        } else {
            self.total_fetched += batch.len() as u64;
            debug!(
                "Fetched batch of {} documents from '{}' (total: {})",
                batch.len(),
                self.collection,
                self.total_fetched
            );
            Ok(Some(batch))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.cursor = None;
            self.closed = true;
            debug!(
                "Closed cursor over '{}' after {} documents",
                self.collection, self.total_fetched
            );
        }
        Ok(())
    }
}

impl Drop for CursorSource {
    fn drop(&mut self) {
        // Ensure the cursor is released even without an explicit close
        if !self.closed {
            debug!("CursorSource for '{}' dropped without close", self.collection);
            self.cursor = None;
        }
    }
}

/// In-memory document source
///
/// Yields pre-built batches; used by tests and available for dry runs.
pub struct VecSource {
    batches: Vec<Vec<Document>>,
    current: usize,
}

impl VecSource {
    /// Create a source from pre-built batches.
    pub fn new(batches: Vec<Vec<Document>>) -> Self {
        Self {
            batches,
            current: 0,
        }
    }
}

#[async_trait]
impl DocumentSource for VecSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        if self.current < self.batches.len() {
            let batch = self.batches[self.current].clone();
            self.current += 1;
            Ok(Some(batch))
        } else {
            Ok(None)
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
