//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline moves through its stages.
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a web socket, or a log record
//! without the library knowing how the host application communicates. Chunks
//! are analyzed strictly one after another, so events for a single run always
//! arrive in order; the trait is still `Send + Sync` so a callback can be
//! shared across concurrent sessions.

use std::sync::Arc;

/// Called by the pipeline as it works through one upload.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called when text extraction begins.
    fn on_extraction_start(&self) {}

    /// Called when extraction finishes.
    ///
    /// * `total_pages` — pages found in the document
    fn on_extraction_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before the bearer-token exchange with the identity service.
    fn on_token_fetch(&self) {}

    /// Called once the chunk count is known, before any generation call.
    fn on_analysis_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before chunk `index` (1-based) is sent for generation.
    fn on_chunk_start(&self, index: usize, total_chunks: usize) {
        let _ = (index, total_chunks);
    }

    /// Called when a chunk's generation call returned model output.
    fn on_chunk_complete(&self, index: usize, total_chunks: usize, output_len: usize) {
        let _ = (index, total_chunks, output_len);
    }

    /// Called when a chunk's generation call soft-failed.
    ///
    /// The diagnostic string is still appended to the report; this event is
    /// informational only.
    fn on_chunk_soft_failure(&self, index: usize, total_chunks: usize, diagnostic: &str) {
        let _ = (index, total_chunks, diagnostic);
    }

    /// Called after the last chunk, once the report string is final.
    fn on_analysis_complete(&self, total_chunks: usize, soft_failed: usize) {
        let _ = (total_chunks, soft_failed);
    }

    /// Called when document conversion begins.
    fn on_document_start(&self) {}
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        chunk_starts: AtomicUsize,
        chunk_completes: AtomicUsize,
        soft_failures: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_chunk_start(&self, _index: usize, _total: usize) {
            self.chunk_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _index: usize, _total: usize, _len: usize) {
            self.chunk_completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_soft_failure(&self, _index: usize, _total: usize, _diag: &str) {
            self.soft_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start();
        cb.on_extraction_complete(3);
        cb.on_token_fetch();
        cb.on_analysis_start(1);
        cb.on_chunk_start(1, 1);
        cb.on_chunk_complete(1, 1, 42);
        cb.on_chunk_soft_failure(1, 1, "boom");
        cb.on_analysis_complete(1, 0);
        cb.on_document_start();
    }

    #[test]
    fn tracking_callback_receives_events() {
        let cb = TrackingCallback {
            chunk_starts: AtomicUsize::new(0),
            chunk_completes: AtomicUsize::new(0),
            soft_failures: AtomicUsize::new(0),
        };
        cb.on_chunk_start(1, 2);
        cb.on_chunk_complete(1, 2, 100);
        cb.on_chunk_start(2, 2);
        cb.on_chunk_soft_failure(2, 2, "timeout");

        assert_eq!(cb.chunk_starts.load(Ordering::SeqCst), 2);
        assert_eq!(cb.chunk_completes.load(Ordering::SeqCst), 1);
        assert_eq!(cb.soft_failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn AnalysisProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_analysis_start(10);
        cb.on_chunk_start(1, 10);
    }
}
