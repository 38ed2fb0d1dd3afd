//! JSON array writer for export operations
//!
//! Normalized records stream into a pretty-printed JSON array (2-space
//! indentation, byte-identical to `serde_json::to_string_pretty` of the
//! full sequence). Output goes to a `.tmp` sibling first and is renamed
//! over the destination on finalize, so a failed export never leaves a
//! partial file committed.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{ExportError, Result};

/// Trait for writing normalized records to an output file
#[async_trait]
pub trait SnapshotSink: Send {
    /// Write a batch of records
    ///
    /// # Arguments
    /// * `records` - Slice of JSON records to append
    ///
    /// # Returns
    /// * `Result<usize>` - Number of records written
    async fn write_batch(&mut self, records: &[JsonValue]) -> Result<usize>;

    /// Commit the output (close the array, flush, rename into place)
    async fn finalize(&mut self) -> Result<()>;

    /// Remove any uncommitted output after a failure
    async fn discard(&mut self) -> Result<()>;

    /// Bytes written so far
    fn bytes_written(&self) -> u64;
}

/// Writer producing a pretty-printed JSON array file
pub struct JsonArrayWriter {
    writer: Option<BufWriter<File>>,
    dest: PathBuf,
    tmp: PathBuf,
    written: usize,
    bytes: u64,
    finalized: bool,
}

impl JsonArrayWriter {
    /// Create a writer targeting `dest`.
    ///
    /// The parent directory must already exist. The destination itself is
    /// not touched until [`SnapshotSink::finalize`].
    ///
    /// # Arguments
    /// * `dest` - Final output path
    ///
    /// # Returns
    /// * `Result<Self>` - New writer instance or error
    pub async fn create(dest: &Path) -> Result<Self> {
        validate_parent(dest)?;
        let tmp = tmp_path(dest);
        let file = File::create(&tmp).await.map_err(|e| {
            ExportError::Generic(format!("Failed to create {}: {e}", tmp.display()))
        })?;

        debug!("Created JSON array writer for: {}", dest.display());

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            dest: dest.to_path_buf(),
            tmp,
            written: 0,
            bytes: 0,
            finalized: false,
        })
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ExportError::Generic("Writer already finalized".into()))?;
        writer
            .write_all(data)
            .await
            .map_err(|e| ExportError::Generic(format!("Failed to write to file: {e}")))?;
        self.bytes += data.len() as u64;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for JsonArrayWriter {
    async fn write_batch(&mut self, records: &[JsonValue]) -> Result<usize> {
        for record in records {
            let lead: &[u8] = if self.written == 0 { b"[\n" } else { b",\n" };
            self.write_all(lead).await?;

            let pretty = serde_json::to_string_pretty(record)?;
            let indented = indent_block(&pretty, "  ");
            self.write_all(indented.as_bytes()).await?;

            self.written += 1;
        }

        debug!(
            "Buffered {} records into {} (total: {})",
            records.len(),
            self.tmp.display(),
            self.written
        );
        Ok(records.len())
    }

    async fn finalize(&mut self) -> Result<()> {
        let tail: &[u8] = if self.written == 0 { b"[]" } else { b"\n]" };
        self.write_all(tail).await?;

        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .await
                .map_err(|e| ExportError::Generic(format!("Failed to flush file: {e}")))?;
        }

        tokio::fs::rename(&self.tmp, &self.dest).await.map_err(|e| {
            ExportError::Generic(format!(
                "Failed to move {} into place: {e}",
                self.tmp.display()
            ))
        })?;
        self.finalized = true;

        debug!(
            "Finalized {} ({} records, {} bytes)",
            self.dest.display(),
            self.written,
            self.bytes
        );
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        self.writer.take();
        if !self.finalized {
            tokio::fs::remove_file(&self.tmp).await.ok();
        }
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl Drop for JsonArrayWriter {
    fn drop(&mut self) {
        // A dropped, unfinalized writer must not leave its temp file behind
        if !self.finalized {
            std::fs::remove_file(&self.tmp).ok();
        }
    }
}

/// Temp sibling of the destination (`lessons.json` -> `lessons.json.tmp`).
fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Prefix every line of a rendered JSON block for array nesting.
fn indent_block(block: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(block.len() + prefix.len() * 8);
    for (i, line) in block.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(prefix);
        out.push_str(line);
    }
    out
}

/// Helper validating that the destination's directory exists
///
/// # Arguments
/// * `path` - Destination path to validate
///
/// # Returns
/// * `Result<()>` - Success or error
fn validate_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(ExportError::Generic(format!(
            "Directory does not exist: {}",
            parent.display()
        )));
    }
    Ok(())
}
