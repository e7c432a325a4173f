//! Pipeline stages for document text extraction.
//!
//! Each submodule implements one step. The router in [`crate::extract`]
//! picks which steps run for a given [`input::DocumentKind`].
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ text_layer ───────────────────────────────────┐
//! input ──▶ ─┤   (pdf, has text)                               ├─▶ postprocess
//! (classify) ├─▶ render ──▶ preprocess ──▶ encode ──▶ ocr ─────┤   (trim, reject
//!            │   (pdfium)   (gray/median/   (png)   (tesseract)│    empty)
//!            │              threshold)                         │
//!            └─▶ tabular ──────────────────────────────────────┘
//!                (csv/xlsx)
//! ```
//!
//! 1. [`input`] — check the file is readable and classify it from the hint
//! 2. [`text_layer`] — detect and read embedded PDF text
//! 3. [`render`] — rasterise PDF pages one at a time through pdfium
//! 4. [`preprocess`] — grayscale, median denoise, adaptive threshold
//! 5. [`encode`] — PNG-encode the bitmap into a scoped temp file
//! 6. [`ocr`] — run the OCR engine on one bitmap
//! 7. [`tabular`] — render a CSV or first worksheet as fixed-width text
//! 8. [`postprocess`] — clean OCR lines, join pages, reject empty output
//!
//! Every stage is synchronous. Async callers go through
//! [`crate::extract_async`], which moves the whole pipeline onto tokio's
//! blocking pool.

pub mod encode;
pub mod input;
pub mod ocr;
pub mod postprocess;
pub mod preprocess;
pub mod render;
pub mod tabular;
pub mod text_layer;
