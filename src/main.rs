//! mongosnap - MongoDB collection snapshot exporter
//!
//! Connects to a MongoDB database, reads the `lessons` and `orders`
//! collections in full, normalizes BSON-only field types to plain
//! strings, and writes each collection to a pretty-printed JSON array
//! file. The run either completes or fails as a whole; any failure
//! leaves no partial output behind and exits non-zero.
//!
//! # Usage
//!
//! ```bash
//! mongosnap mongodb://localhost:27017
//! MONGODB_URI=mongodb://localhost:27017 mongosnap
//! ```

use tracing::Level;

use mongosnap::cli::CliInterface;
use mongosnap::error::Result;
use mongosnap::runner::Runner;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Export failed: {e}");
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Execute the export run
///
/// # Returns
/// * `Result<()>` - Success or the run's single failure
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    let quiet = cli.args().quiet;
    let runner = Runner::new(cli.into_config(), quiet);
    runner.run().await?;

    Ok(())
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
