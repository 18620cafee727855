//! Progress-callback trait for per-section conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline assembles and writes each section.
//!
//! # Example
//!
//! ```rust
//! use pdf2md_outline::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     chunks: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_section_complete(&self, _index: usize, _total: usize, chunk_count: usize) {
//!         self.chunks.fetch_add(chunk_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { chunks: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each section.
///
/// The pipeline itself is sequential, but [`crate::convert::convert`] runs it
/// on a blocking thread, so implementations must be `Send + Sync`. All methods
/// have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the outline has been structured.
    ///
    /// # Arguments
    /// * `total_sections` — sections that will be written; `1` when the
    ///   document has no outline and is chunked as a whole
    fn on_conversion_start(&self, total_sections: usize) {
        let _ = total_sections;
    }

    /// Called before a section's text is assembled.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in page order
    /// * `total` — total sections
    /// * `id`    — dotted section id (`"document"` without an outline)
    /// * `title` — outline title
    fn on_section_start(&self, index: usize, total: usize, id: &str, title: &str) {
        let _ = (index, total, id, title);
    }

    /// Called once a section's chunk files have been written.
    fn on_section_complete(&self, index: usize, total: usize, chunk_count: usize) {
        let _ = (index, total, chunk_count);
    }

    /// Called when an embedded image is skipped because it failed to decode
    /// or save.
    ///
    /// # Arguments
    /// * `page`  — 1-indexed page number
    /// * `error` — human-readable error description
    fn on_image_error(&self, page: usize, error: &str) {
        let _ = (page, error);
    }

    /// Called once after every section has been written.
    fn on_conversion_complete(&self, total_sections: usize, total_chunks: usize) {
        let _ = (total_sections, total_chunks);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        chunks: AtomicUsize,
        image_errors: AtomicUsize,
        announced: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_sections: usize) {
            self.announced.store(total_sections, Ordering::SeqCst);
        }

        fn on_section_start(&self, _index: usize, _total: usize, _id: &str, _title: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_section_complete(&self, _index: usize, _total: usize, chunk_count: usize) {
            self.chunks.fetch_add(chunk_count, Ordering::SeqCst);
        }

        fn on_image_error(&self, _page: usize, _error: &str) {
            self.image_errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_section_start(1, 5, "1", "Intro");
        cb.on_section_complete(1, 5, 3);
        cb.on_image_error(2, "bad image");
        cb.on_conversion_complete(5, 12);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(2);
        tracker.on_section_start(1, 2, "1", "Intro");
        tracker.on_section_complete(1, 2, 3);
        tracker.on_section_start(2, 2, "2", "Methods");
        tracker.on_image_error(4, "decode failed");
        tracker.on_section_complete(2, 2, 1);

        assert_eq!(tracker.announced.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.chunks.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.image_errors.load(Ordering::SeqCst), 1);
    }
}
