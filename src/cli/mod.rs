//! Command-line interface for mongosnap
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Merging arguments over config file and environment values

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

/// Snapshot exporter for MongoDB collections
#[derive(Parser, Debug)]
#[command(
    name = "mongosnap",
    version,
    about = "Export MongoDB collections to JSON snapshot files",
    long_about = "Reads the lessons and orders collections in full, normalizes ObjectIds,\n\
                  identifier lists, and timestamps to plain strings, and writes each\n\
                  collection to a pretty-printed JSON array file."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    ///
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    /// Falls back to the MONGODB_URI environment variable.
    #[arg(value_name = "URI")]
    pub uri: Option<String>,

    /// Database name holding the collections
    #[arg(short = 'd', long, value_name = "NAME")]
    pub database: Option<String>,

    /// Directory receiving the exported JSON files
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Sort documents by _id for reproducible output
    #[arg(long)]
    pub stable_order: bool,

    /// Documents fetched per cursor batch
    #[arg(long, value_name = "N")]
    pub batch_size: Option<u32>,

    /// Server selection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Quiet mode (no progress output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,
}

/// Parsed CLI arguments merged with the loaded configuration
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Parse arguments and load configuration.
    ///
    /// # Returns
    /// * `Result<Self>` - Interface with merged settings, or config error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        Self::from_args(args)
    }

    /// Build the interface from pre-parsed arguments.
    ///
    /// Precedence: arguments > environment > config file > defaults
    /// (`Config::load` already applies the environment layer).
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;

        if let Some(uri) = &args.uri {
            config.connection.uri = Some(uri.clone());
        }
        if let Some(database) = &args.database {
            config.connection.database = database.clone();
        }
        if let Some(output_dir) = &args.output_dir {
            config.export.output_dir = output_dir.clone();
        }
        if args.stable_order {
            config.export.stable_order = true;
        }
        if let Some(batch_size) = args.batch_size {
            config.export.batch_size = batch_size;
        }
        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }

        Ok(Self { args, config })
    }

    /// Parsed arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Merged configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the interface, yielding the merged configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_uri_argument_overrides_config() {
        let args = parse(&["mongosnap", "mongodb://example:27017"]);
        let cli = CliInterface::from_args(args).unwrap();
        assert_eq!(
            cli.config().connection.uri.as_deref(),
            Some("mongodb://example:27017")
        );
    }

    #[test]
    fn test_flags_merge_into_config() {
        let args = parse(&[
            "mongosnap",
            "--database",
            "other_db",
            "--output-dir",
            "dump",
            "--stable-order",
            "--batch-size",
            "250",
            "--timeout",
            "5",
        ]);
        let cli = CliInterface::from_args(args).unwrap();

        let config = cli.config();
        assert_eq!(config.connection.database, "other_db");
        assert_eq!(config.export.output_dir, PathBuf::from("dump"));
        assert!(config.export.stable_order);
        assert_eq!(config.export.batch_size, 250);
        assert_eq!(config.connection.timeout, 5);
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = parse(&["mongosnap"]);
        let cli = CliInterface::from_args(args).unwrap();

        // database/uri may come from the environment; only check settings
        // the environment cannot influence
        assert!(!cli.args().quiet);
        assert_eq!(cli.config().export.output_dir, PathBuf::from("exports"));
        assert_eq!(cli.config().export.batch_size, 1000);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = parse(&["mongosnap", "--config", "/no/such/file.toml"]);
        assert!(CliInterface::from_args(args).is_err());
    }
}
