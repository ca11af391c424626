//! Progress-callback trait for extraction and per-fragment translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events as the pipeline runs.
//!
//! Fragments are translated strictly one after another, so events arrive in
//! fragment order and [`TranslationProgressCallback::on_progress`] values are
//! strictly increasing within a run. Implementations must still be
//! `Send + Sync`: the pipeline runs on a multi-threaded Tokio runtime and
//! extraction events are emitted from a blocking worker thread.
//!
//! # Example
//!
//! ```rust
//! use pdf_translate::{TranslationProgressCallback, TranslationConfig};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl TranslationProgressCallback for LastPercent {
//!     fn on_progress(&self, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(LastPercent(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it extracts and translates a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Positions are 1-based.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called after each source page's text has been extracted.
    ///
    /// # Arguments
    /// * `percent`: extraction progress, 0–100
    /// * `page`: 1-indexed page just processed
    /// * `total_pages`: pages in the source document
    fn on_extraction_progress(&self, percent: u8, page: usize, total_pages: usize) {
        let _ = (percent, page, total_pages);
    }

    /// Called once after segmentation, before the first backend call.
    fn on_translation_start(&self, total_fragments: usize) {
        let _ = total_fragments;
    }

    /// Called just before the first attempt on a fragment.
    fn on_fragment_start(&self, position: usize, total: usize) {
        let _ = (position, total);
    }

    /// Called when an attempt failed and the client is about to back off.
    ///
    /// # Arguments
    /// * `retry`: 1-based retry about to be made after the wait
    /// * `wait_ms`: backoff delay
    /// * `error`: why the previous attempt failed
    fn on_fragment_retry(&self, position: usize, total: usize, retry: u32, wait_ms: u64, error: &str) {
        let _ = (position, total, retry, wait_ms, error);
    }

    /// Called once per completed fragment with
    /// `round(completed / total × 100)`.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called when a fragment exhausted its retries. The run aborts afterwards.
    fn on_fragment_error(&self, position: usize, total: usize, error: &str) {
        let _ = (position, total, error);
    }

    /// Called once after every fragment translated successfully.
    fn on_translation_complete(&self, total_fragments: usize, output_len: usize) {
        let _ = (total_fragments, output_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

/// `round(done / total × 100)`, clamped to 0–100. `total == 0` counts as done.
pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (done.min(total) as f64 / total as f64 * 100.0).round();
    pct as u8
}

/// Map a 0–100 percentage into the `lo..=hi` band.
///
/// Lets a caller embed translation progress in a wider scale, e.g.
/// extraction owns 0–10 and translation 10–90.
pub fn remap_progress(percent: u8, lo: u8, hi: u8) -> u8 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let span = (hi - lo) as f64;
    let p = percent.min(100) as f64 / 100.0;
    (lo as f64 + (span * p).round()) as u8
}

/// Forwards every event to an inner callback, remapping
/// [`TranslationProgressCallback::on_progress`] into a fixed band.
pub struct RemappedProgress {
    inner: ProgressCallback,
    lo: u8,
    hi: u8,
}

impl RemappedProgress {
    pub fn new(inner: ProgressCallback, lo: u8, hi: u8) -> Self {
        Self { inner, lo, hi }
    }
}

impl TranslationProgressCallback for RemappedProgress {
    fn on_extraction_progress(&self, percent: u8, page: usize, total_pages: usize) {
        self.inner.on_extraction_progress(percent, page, total_pages);
    }

    fn on_translation_start(&self, total_fragments: usize) {
        self.inner.on_translation_start(total_fragments);
    }

    fn on_fragment_start(&self, position: usize, total: usize) {
        self.inner.on_fragment_start(position, total);
    }

    fn on_fragment_retry(&self, position: usize, total: usize, retry: u32, wait_ms: u64, error: &str) {
        self.inner
            .on_fragment_retry(position, total, retry, wait_ms, error);
    }

    fn on_progress(&self, percent: u8) {
        self.inner
            .on_progress(remap_progress(percent, self.lo, self.hi));
    }

    fn on_fragment_error(&self, position: usize, total: usize, error: &str) {
        self.inner.on_fragment_error(position, total, error);
    }

    fn on_translation_complete(&self, total_fragments: usize, output_len: usize) {
        self.inner
            .on_translation_complete(total_fragments, output_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        percents: Mutex<Vec<u8>>,
        retries: Mutex<Vec<(usize, u32, u64)>>,
    }

    impl TranslationProgressCallback for Recorder {
        fn on_progress(&self, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }

        fn on_fragment_retry(&self, position: usize, _total: usize, retry: u32, wait_ms: u64, _error: &str) {
            self.retries.lock().unwrap().push((position, retry, wait_ms));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_progress(50, 1, 2);
        cb.on_translation_start(3);
        cb.on_fragment_start(1, 3);
        cb.on_fragment_retry(1, 3, 1, 3000, "timeout");
        cb.on_progress(33);
        cb.on_fragment_error(2, 3, "exhausted");
        cb.on_translation_complete(3, 1024);
    }

    #[test]
    fn percent_complete_rounds() {
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(3, 3), 100);
        assert_eq!(percent_complete(0, 0), 100);
    }

    #[test]
    fn remap_into_band() {
        assert_eq!(remap_progress(0, 10, 90), 10);
        assert_eq!(remap_progress(50, 10, 90), 50);
        assert_eq!(remap_progress(100, 10, 90), 90);
    }

    #[test]
    fn remapped_adapter_forwards_events() {
        let rec = Arc::new(Recorder::default());
        let adapter = RemappedProgress::new(rec.clone(), 10, 90);
        adapter.on_progress(100);
        adapter.on_fragment_retry(2, 4, 1, 3000, "HTTP 503");
        assert_eq!(*rec.percents.lock().unwrap(), vec![90]);
        assert_eq!(*rec.retries.lock().unwrap(), vec![(2, 1, 3000)]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn TranslationProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_translation_start(10);
        cb.on_progress(10);
    }
}
