//! MongoDB Collection Snapshot Exporter
//!
//! This library provides the core functionality for mongosnap: a one-shot
//! export of the `lessons` and `orders` collections to JSON files, with
//! BSON-only field types normalized to plain strings.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `exporter`: Collection export pipeline (source, normalize, sink)
//! - `runner`: Run orchestration and summary reporting
//!
//! # Example
//!
//! ```no_run
//! use mongosnap::{config::Config, runner::Runner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.connection.uri = Some("mongodb://localhost:27017".to_string());
//!
//!     let report = Runner::new(config, false).run().await?;
//!     println!("Exported {} collections", report.outcomes.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod exporter;
pub mod runner;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{ExportError, Result};
pub use exporter::{CollectionExporter, ExportOutcome, FieldRule, FieldRules};
pub use runner::{ExportPlan, RunReport, Runner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
