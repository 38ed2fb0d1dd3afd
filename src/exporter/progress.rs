//! Progress feedback for export operations
//!
//! A snapshot export has no cheap way to know the document count up
//! front, so progress is shown as a spinner with a running count and
//! throughput rather than a bounded bar.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for one collection export
pub struct ProgressTracker {
    /// Start time of the operation
    start_time: Instant,
    /// Progress spinner (absent in quiet mode)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `collection` - Collection name shown next to the counter
    /// * `enable_bar` - Whether to display the spinner
    pub fn new(collection: &str, enable_bar: bool) -> Self {
        let bar = if enable_bar {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix}: {pos} documents {msg}")
                    .unwrap(),
            );
            pb.set_prefix(collection.to_string());
            Some(pb)
        } else {
            None
        };

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Update progress with the total processed so far
    pub fn update(&self, count: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_position(count);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = count as f64 / elapsed;
                bar.set_message(format!("({speed:.0} docs/sec)"));
            }
        }
    }

    /// Milliseconds since the tracker was created
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Finish and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_silent_mode() {
        let tracker = ProgressTracker::new("lessons", false);
        tracker.update(500);
        tracker.finish();
    }

    #[test]
    fn test_tracker_elapsed_monotonic() {
        let tracker = ProgressTracker::new("orders", false);
        let first = tracker.elapsed_ms();
        let second = tracker.elapsed_ms();
        assert!(second >= first);
    }
}
