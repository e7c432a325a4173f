//! PDF access: embedded page text and page rasterisation.
//!
//! Everything that touches a PDF goes through the [`PdfBackend`] trait so the
//! router never depends on pdfium directly. [`PdfiumBackend`] is the
//! production implementation; tests substitute in-memory fakes.
//!
//! Both operations are visitor-based. Pages are produced in page order and
//! handed to the caller one at a time, so the text-layer detector can stop at
//! the first page with text and the OCR path never holds more than one
//! 300-DPI bitmap in memory.
//!
//! pdfium keeps thread-local state and is not async-safe; callers on a tokio
//! runtime go through [`crate::extract_async`], which moves the whole
//! extraction onto the blocking pool.

use crate::error::{ExtractError, PageError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number (1 for standalone image files).
    pub page_num: usize,
    pub image: DynamicImage,
}

/// Rasterisation settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub dpi: u32,
    pub max_rendered_pixels: u32,
    pub password: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 10_000,
            password: None,
        }
    }
}

/// Visitor for page text: `(page_num, total_pages, text)`. Return
/// `ControlFlow::Break(())` to stop early.
pub type TextVisitor<'a> =
    dyn FnMut(usize, usize, Result<String, PageError>) -> ControlFlow<()> + 'a;

/// Visitor for rendered pages: `(page_num, total_pages, image)`.
pub type PageVisitor<'a> = dyn FnMut(usize, usize, Result<PageImage, PageError>) + 'a;

/// Read access to PDF documents.
///
/// Document-level failures (cannot open, wrong password, no pdfium) are
/// returned as `Err`; page-level failures are passed to the visitor so the
/// caller decides how lenient to be.
pub trait PdfBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Number of pages in the document.
    fn page_count(&self, path: &Path, password: Option<&str>) -> Result<usize, ExtractError>;

    /// Visit the embedded text of each page in order.
    ///
    /// Returns the document's page count.
    fn visit_page_text(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut TextVisitor<'_>,
    ) -> Result<usize, ExtractError>;

    /// Rasterise each page in order and hand it to `visit`.
    ///
    /// Returns the document's page count.
    fn render_pages(
        &self,
        path: &Path,
        options: &RenderOptions,
        visit: &mut PageVisitor<'_>,
    ) -> Result<usize, ExtractError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`PdfBackend`] backed by the pdfium library via `pdfium-render`.
///
/// The library is bound per call, so constructing the backend never fails
/// and CSV/image extraction works on hosts without pdfium installed.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Bind to `library_path` if given, otherwise to the system library.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

/// Open `pdf_path`, mapping pdfium's error to the matching fatal variant.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExtractError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ExtractError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ExtractError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// pdfium reports line breaks inside a text object as `\r\n`.
fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

impl PdfBackend for PdfiumBackend {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn page_count(&self, path: &Path, password: Option<&str>) -> Result<usize, ExtractError> {
        let pdfium = self.bind()?;
        let document = load_document(&pdfium, path, password)?;
        Ok(document.pages().len() as usize)
    }

    fn visit_page_text(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut TextVisitor<'_>,
    ) -> Result<usize, ExtractError> {
        let pdfium = self.bind()?;
        let document = load_document(&pdfium, path, password)?;
        let pages = document.pages();
        let total_pages = pages.len() as usize;
        debug!("PDF loaded for text: {} pages", total_pages);

        for idx in 0..total_pages {
            let page_num = idx + 1;
            let text = pages
                .get(idx as u16)
                .and_then(|page| page.text().map(|t| t.all()))
                .map(|t| normalise_line_endings(&t))
                .map_err(|e| PageError::TextUnavailable {
                    page: page_num,
                    detail: format!("{:?}", e),
                });

            if visit(page_num, total_pages, text).is_break() {
                break;
            }
        }

        Ok(total_pages)
    }

    fn render_pages(
        &self,
        path: &Path,
        options: &RenderOptions,
        visit: &mut PageVisitor<'_>,
    ) -> Result<usize, ExtractError> {
        let pdfium = self.bind()?;
        let document = load_document(&pdfium, path, options.password.as_deref())?;
        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded for rasterisation: {} pages", total_pages);

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(options.dpi as f32 / 72.0)
            .set_maximum_width(options.max_rendered_pixels as i32)
            .set_maximum_height(options.max_rendered_pixels as i32);

        for idx in 0..total_pages {
            let page_num = idx + 1;
            let rendered = pages
                .get(idx as u16)
                .and_then(|page| {
                    page.render_with_config(&render_config).map(|bitmap| {
                        let image = bitmap.as_image();
                        debug!(
                            "Rendered page {} → {}x{} px",
                            page_num,
                            image.width(),
                            image.height()
                        );
                        PageImage { page_num, image }
                    })
                })
                .map_err(|e| PageError::RenderFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                });

            visit(page_num, total_pages, rendered);
        }

        Ok(total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_options_use_300_dpi() {
        let opts = RenderOptions::default();
        assert_eq!(opts.dpi, 300);
        assert!(opts.password.is_none());
    }

    #[test]
    fn line_endings_are_normalised() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn pdfium_backend_constructs_without_library() {
        let backend = PdfiumBackend::new(Some(PathBuf::from("/nowhere/libpdfium.so")));
        assert_eq!(backend.name(), "pdfium");
    }
}
