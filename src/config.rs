//! Configuration types for document extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Tool locations and recognition
//! parameters live here rather than in process-wide state, so two configs
//! can coexist in one process and each call sees exactly the values it was
//! given.
//!
//! The defaults are tuned for dense printed datasheets: 300 DPI rendering,
//! a 3×3 median denoise, an 11-pixel adaptive Gaussian threshold with offset
//! 2, and Tesseract's single-uniform-block segmentation.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::render::PdfBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docextract::{ExtractionConfig, RecognitionMode};
///
/// let config = ExtractionConfig::builder()
///     .dpi(300)
///     .recognition_mode(RecognitionMode::SingleBlock)
///     .tesseract_cmd("/usr/local/bin/tesseract")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rasterisation DPI for scanned PDF pages. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 10000.
    ///
    /// A memory cap independent of DPI: an A0 drawing at 300 DPI would be
    /// roughly 10 000 × 14 000 px. A4 at 300 DPI (2480 × 3508) is unaffected.
    pub max_rendered_pixels: u32,

    /// OCR page-segmentation assumption. Default: [`RecognitionMode::SingleBlock`].
    pub recognition_mode: RecognitionMode,

    /// Median-filter kernel edge length (odd). Default: 3.
    pub denoise_kernel: u32,

    /// Adaptive-threshold neighbourhood edge length (odd, ≥ 3). Default: 11.
    pub threshold_block_size: u32,

    /// Constant subtracted from the local mean before thresholding. Default: 2.
    pub threshold_offset: i32,

    /// Tesseract executable. Default: `tesseract` (resolved via `PATH`).
    pub tesseract_cmd: PathBuf,

    /// Optional `--tessdata-dir` passed to Tesseract.
    pub tessdata_dir: Option<PathBuf>,

    /// Path to the pdfium shared library. If None, the system library is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed PDF backend. Takes precedence over `pdfium_library_path`.
    pub pdf_backend: Option<Arc<dyn PdfBackend>>,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_cmd`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 10_000,
            recognition_mode: RecognitionMode::default(),
            denoise_kernel: 3,
            threshold_block_size: 11,
            threshold_offset: 2,
            tesseract_cmd: PathBuf::from("tesseract"),
            tessdata_dir: None,
            pdfium_library_path: None,
            password: None,
            pdf_backend: None,
            ocr_engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("recognition_mode", &self.recognition_mode)
            .field("denoise_kernel", &self.denoise_kernel)
            .field("threshold_block_size", &self.threshold_block_size)
            .field("threshold_offset", &self.threshold_offset)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdf_backend", &self.pdf_backend.as_ref().map(|b| b.name().to_string()))
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|e| e.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn recognition_mode(mut self, mode: RecognitionMode) -> Self {
        self.config.recognition_mode = mode;
        self
    }

    pub fn denoise_kernel(mut self, k: u32) -> Self {
        self.config.denoise_kernel = k;
        self
    }

    pub fn threshold_block_size(mut self, k: u32) -> Self {
        self.config.threshold_block_size = k;
        self
    }

    pub fn threshold_offset(mut self, c: i32) -> Self {
        self.config.threshold_offset = c;
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.config.pdf_backend = Some(backend);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.denoise_kernel == 0 || c.denoise_kernel % 2 == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "Denoise kernel must be a positive odd number, got {}",
                c.denoise_kernel
            )));
        }
        if c.threshold_block_size < 3 || c.threshold_block_size % 2 == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "Threshold block size must be odd and ≥ 3, got {}",
                c.threshold_block_size
            )));
        }
        if c.tesseract_cmd.as_os_str().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "Tesseract command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Layout assumption handed to the OCR engine.
///
/// The value is fixed per configuration and applied to every page; it is
/// never derived from document content. `SingleBlock` treats the whole page
/// as one uniform block of text with no layout analysis, which keeps output
/// predictable across similarly formatted datasheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionMode {
    /// Fully automatic page segmentation (Tesseract PSM 3).
    Auto,
    /// A single column of text of variable sizes (PSM 4).
    SingleColumn,
    /// A single uniform block of text (PSM 6). (default)
    #[default]
    SingleBlock,
    /// A single text line (PSM 7).
    SingleLine,
    /// As much text as possible in no particular order (PSM 11).
    SparseText,
}

impl RecognitionMode {
    /// Tesseract `--psm` value for this mode.
    pub fn psm(&self) -> u8 {
        match self {
            RecognitionMode::Auto => 3,
            RecognitionMode::SingleColumn => 4,
            RecognitionMode::SingleBlock => 6,
            RecognitionMode::SingleLine => 7,
            RecognitionMode::SparseText => 11,
        }
    }

    /// Inverse of [`RecognitionMode::psm`].
    pub fn from_psm(psm: u8) -> Option<Self> {
        match psm {
            3 => Some(RecognitionMode::Auto),
            4 => Some(RecognitionMode::SingleColumn),
            6 => Some(RecognitionMode::SingleBlock),
            7 => Some(RecognitionMode::SingleLine),
            11 => Some(RecognitionMode::SparseText),
            _ => None,
        }
    }
}
