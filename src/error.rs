//! Error types for the edgequake-docextract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the document cannot produce content at all
//!   (missing file, unsupported type, unparseable table, nothing extracted).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single PDF page could not be rendered
//!   or recognised, but the remaining pages are fine. Stored inside
//!   [`crate::output::ExtractionStats`] so callers can see which pages were
//!   degraded instead of losing the whole document to one bad page.
//!
//! A third, narrower type, [`OcrError`], is what an [`crate::pipeline::ocr::OcrEngine`]
//! returns. The router converts it into one of the two above depending on
//! whether there are other pages to fall back on.

use crate::output::Strategy;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docextract library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::ExtractionStats`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is a regular file.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The type hint matched no known category and the extension did not help.
    #[error("No extractor available for '{path}' (type hint: {type_hint:?})")]
    UnsupportedType { path: PathBuf, type_hint: String },

    // ── Content errors ────────────────────────────────────────────────────
    /// CSV or spreadsheet could not be parsed.
    #[error("Failed to parse table '{path}': {detail}")]
    TabularParseFailure { path: PathBuf, detail: String },

    /// Extraction finished but produced no non-whitespace text.
    ///
    /// `detail` carries the cause when the document could not be processed
    /// at all (e.g. rasterisation failed), as opposed to a blank scan.
    #[error(
        "No content could be extracted from '{path}' (strategy: {strategy}){}",
        detail_suffix(.detail)
    )]
    EmptyContent {
        path: PathBuf,
        strategy: Strategy,
        detail: Option<String>,
    },

    /// An image file could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    /// OCR failed on a standalone image (there is no other page to fall back on).
    #[error("OCR failed for '{path}': {source}")]
    OcrFailed {
        path: PathBuf,
        #[source]
        source: OcrError,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium from https://github.com/bblanchon/pdfium-binaries and either\n\
  • put libpdfium on the system library path, or\n\
  • pass --pdfium-lib /path/to/libpdfium (env: DOCEXTRACT_PDFIUM_LIB).\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// `true` for errors caused by the caller's input rather than its content
    /// (missing file, unreadable file, unknown type).
    ///
    /// Services typically map these to "not found" / "bad request" and the
    /// rest to "unprocessable".
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractError::InputNotFound { .. }
                | ExtractError::PermissionDenied { .. }
                | ExtractError::UnsupportedType { .. }
        )
    }
}

/// A non-fatal error for a single PDF page.
///
/// The page contributes no text; the extraction continues with the next page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine failed on this page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// The page's embedded text could not be read.
    #[error("Page {page}: text layer unreadable: {detail}")]
    TextUnavailable { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::OcrFailed { page, .. }
            | PageError::TextUnavailable { page, .. } => *page,
        }
    }
}

/// Failure reported by an OCR engine adapter.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be started (binary missing, not executable).
    #[error("OCR engine '{command}' could not be started: {reason}")]
    Unavailable { command: String, reason: String },

    /// The engine ran but exited unsuccessfully.
    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    /// The bitmap could not be handed to the engine.
    #[error("Failed to encode image for OCR: {0}")]
    Encode(String),

    /// Temp-file I/O around the engine call failed.
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}
