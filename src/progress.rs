//! Progress-callback trait for per-record extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgress>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as an extractor walks its records.
//!
//! Extractors never know who is listening: the HTTP job service forwards
//! events into the job log, the CLI drives a terminal progress bar, and
//! library callers can ignore them entirely. The trait is `Send + Sync`
//! because extractors run on blocking worker threads.
//!
//! # Example
//!
//! ```rust
//! use corpus2md::{ExtractionConfig, ExtractionProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ExtractionProgress for CountingCallback {
//!     fn on_record_complete(&self, _ordinal: usize, identifier: &str) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("wrote {identifier}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgress>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extractors as they process each record.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Ordinals are 1-indexed.
pub trait ExtractionProgress: Send + Sync {
    /// Called once before the first record.
    ///
    /// `total_records` is `None` when the source cannot tell up front
    /// (remote iteration).
    fn on_batch_start(&self, total_records: Option<usize>) {
        let _ = total_records;
    }

    /// A human-readable note about a batch-level decision, such as the
    /// inferred content column.
    fn on_message(&self, message: &str) {
        let _ = message;
    }

    /// Called when a record has been written.
    fn on_record_complete(&self, ordinal: usize, identifier: &str) {
        let _ = (ordinal, identifier);
    }

    /// Called when a record was already materialized and left untouched.
    fn on_record_skipped(&self, ordinal: usize, identifier: &str) {
        let _ = (ordinal, identifier);
    }

    /// Called when a record failed; the batch continues.
    fn on_record_error(&self, ordinal: usize, error: &str) {
        let _ = (ordinal, error);
    }

    /// Called once after every record has been attempted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl ExtractionProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        completes: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        succeeded_total: AtomicUsize,
    }

    impl ExtractionProgress for TrackingCallback {
        fn on_record_complete(&self, _ordinal: usize, _identifier: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_skipped(&self, _ordinal: usize, _identifier: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_error(&self, _ordinal: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, succeeded: usize, _failed: usize) {
            self.succeeded_total.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgress;
        cb.on_batch_start(Some(5));
        cb.on_message("Using 'text' as the content column");
        cb.on_record_complete(1, "0001_a");
        cb.on_record_skipped(2, "0002_b");
        cb.on_record_error(3, "boom");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            completes: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            succeeded_total: AtomicUsize::new(0),
        };

        tracker.on_record_complete(1, "a");
        tracker.on_record_complete(2, "b");
        tracker.on_record_skipped(3, "c");
        tracker.on_record_error(4, "fetch failed");
        tracker.on_batch_complete(3, 1);

        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded_total.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgress);
        cb.on_batch_start(None);
        cb.on_record_complete(1, "doc_1");
    }
}
