//! # edgequake-docextract
//!
//! Extract normalised plain text from PDFs, scanned documents, images, CSV
//! files and spreadsheets.
//!
//! ## Why this crate?
//!
//! Ingestion pipelines receive datasheets and bills of materials in whatever
//! form the supplier had at hand: born-digital PDFs, scanned PDFs, phone
//! photos, CSV exports, Excel workbooks. Downstream indexing wants one thing,
//! a non-empty string of text. This crate picks the cheapest strategy that
//! works for each input and fails loudly when nothing comes out, instead of
//! handing back an empty string that looks like success.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file + type hint
//!  │
//!  ├─ 1. Input     existence check, classify pdf / image / csv / spreadsheet
//!  ├─ 2. Text      PDF with a text layer → embedded text, pages joined by "\n"
//!  ├─ 3. Raster    PDF without one → pdfium renders each page at 300 DPI
//!  ├─ 4. Prepare   grayscale → 3×3 median → adaptive Gaussian threshold
//!  ├─ 5. OCR       tesseract --psm 6, lines cleaned, pages joined by "\n\n"
//!  ├─ 6. Tabular   CSV / first worksheet → fixed-width table text
//!  └─ 7. Validate  trim; empty → ExtractError::EmptyContent
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docextract::{extract, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let out = extract("datasheet.pdf", "application/pdf", &config)?;
//!     println!("[{}] {}", out.strategy, out.content);
//!     for e in &out.stats.page_errors {
//!         eprintln!("degraded: {e}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## External tools
//!
//! PDFs need the pdfium shared library (system library path, or
//! [`ExtractionConfigBuilder::pdfium_library_path`]). OCR needs the
//! `tesseract` executable ([`ExtractionConfigBuilder::tesseract_cmd`]).
//! Both are only touched when a document needs them, so CSV and spreadsheet
//! extraction work without either installed.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docextract` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docextract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, RecognitionMode};
pub use error::{ExtractError, OcrError, PageError};
pub use extract::{extract, extract_async, extract_bytes, extract_to_file, inspect};
pub use output::{Extraction, ExtractionStats, Inspection, Strategy};
pub use pipeline::input::DocumentKind;
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use pipeline::render::{PdfBackend, PdfiumBackend};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
