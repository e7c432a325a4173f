//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events while a document is processed. Scanned PDFs at 300 DPI take
//! seconds per page, so a caller rendering a progress bar wants to hear
//! about each page as it finishes.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docextract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} chars)", page_num, total_pages, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::Strategy;
use crate::pipeline::input::DocumentKind;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive on the thread running the extraction,
/// in page order.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the input is classified.
    fn on_extraction_start(&self, kind: DocumentKind) {
        let _ = kind;
    }

    /// Called before a page is recognised (OCR path only).
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page produced its (possibly empty) cleaned text;
    /// `text_len` counts characters, not bytes.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page failed and was skipped.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once when the document produced non-empty content of
    /// `content_len` characters.
    fn on_extraction_complete(&self, strategy: Strategy, content_len: usize) {
        let _ = (strategy, content_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
