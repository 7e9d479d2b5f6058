//! Progress-callback trait for per-document and per-page task events.
//!
//! Inject an [`Arc<dyn TaskProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to follow a run as
//! it walks through URLs and pages. The CLI uses it to drive a terminal
//! progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_paperscan::{RunConfig, TaskProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl TaskProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder()
//!     .output_dir("out")
//!     .progress_callback(counter as Arc<dyn TaskProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the tasks as they process documents and pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Tasks run sequentially, so events for one run
/// arrive in order from a single task.
pub trait TaskProgressCallback: Send + Sync {
    /// Called once a document is cached and its page count is known.
    ///
    /// # Arguments
    /// * `url`        : the source URL
    /// * `total_pages`: pages the task will walk for this document
    fn on_document_start(&self, url: &str, total_pages: usize) {
        let _ = (url, total_pages);
    }

    /// Called when an existing artifact is honoured instead of regenerated.
    ///
    /// `page_num` is `None` when the whole document was skipped.
    fn on_skipped(&self, page_num: Option<usize>, artifact: &Path) {
        let _ = (page_num, artifact);
    }

    /// Called after a page has been processed (model call or text counting).
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once per URL after its artifacts are written.
    fn on_document_complete(&self, url: &str) {
        let _ = url;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TaskProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn TaskProgressCallback>;
