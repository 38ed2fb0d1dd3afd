//! Error handling for the snapshot exporter.
//!
//! A run either completes or fails with a single [`ExportError`] carrying
//! the underlying cause. Connection, read, normalization, and write errors
//! all flow through the same taxonomy; the caller decides how to surface
//! the failure (exit code, log line).

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ConnectionError, ExportError, NormalizeError, Result};
