//! Extraction entry points and the router that drives the pipeline.
//!
//! [`extract`] is the core: synchronous, one document per call, no shared
//! state. The other entry points are thin adapters around it for async
//! callers, in-memory uploads and file output.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::output::{Extraction, ExtractionStats, Inspection, Strategy};
use crate::pipeline::input::{self, DocumentKind, SourceDocument};
use crate::pipeline::ocr::{OcrEngine, TesseractEngine};
use crate::pipeline::postprocess::{self, OCR_PAGE_SEPARATOR};
use crate::pipeline::preprocess::{preprocess, PreprocessOptions};
use crate::pipeline::render::{PageImage, PdfBackend, PdfiumBackend, RenderOptions};
use crate::pipeline::{tabular, text_layer};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract normalised plain text from the document at `path`.
///
/// `type_hint` is a free-form description of the file type (`"pdf"`,
/// `"image/png"`, `"text/csv"`, `"xlsx"`, …), matched case-insensitively.
///
/// # Returns
/// `Ok(Extraction)` with non-empty, trimmed content. Individual PDF pages
/// that failed are listed in `stats.page_errors`.
///
/// # Errors
/// - [`ExtractError::InputNotFound`] before any other work if the file is
///   missing
/// - [`ExtractError::UnsupportedType`] if the hint matches nothing
/// - [`ExtractError::EmptyContent`] if every strategy produced nothing
/// - the strategy's own fatal errors (table parse, image decode, …)
pub fn extract(
    path: impl AsRef<Path>,
    type_hint: &str,
    config: &ExtractionConfig,
) -> Result<Extraction, ExtractError> {
    let start = Instant::now();
    let source = input::resolve_input(path.as_ref(), type_hint)?;
    info!("Extracting {} as {}", source.path().display(), source.kind());

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(source.kind());
    }

    let raw = match source.kind() {
        DocumentKind::Pdf => extract_pdf(&source, config)?,
        DocumentKind::Image => extract_image(&source, config)?,
        DocumentKind::Csv | DocumentKind::Spreadsheet => RawExtraction {
            strategy: Strategy::Tabular,
            content: tabular::extract_tabular(source.path(), source.kind())?,
            stats: ExtractionStats::default(),
            failure: None,
        },
    };

    let content =
        postprocess::finalize(&raw.content, source.path(), raw.strategy, raw.failure)?;
    let content_chars = content.chars().count();
    let stats = ExtractionStats {
        duration_ms: start.elapsed().as_millis() as u64,
        ..raw.stats
    };

    info!(
        "Extraction complete: strategy={}, {} chars, {} degraded pages, {}ms",
        raw.strategy,
        content_chars,
        stats.degraded_pages(),
        stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(raw.strategy, content_chars);
    }

    Ok(Extraction {
        strategy: raw.strategy,
        kind: source.kind(),
        content,
        stats,
    })
}

/// Run [`extract`] on tokio's blocking thread pool.
///
/// The pipeline is CPU-bound and calls into pdfium and the OCR engine
/// synchronously, so it must not run on an async worker thread.
pub async fn extract_async(
    path: impl AsRef<Path>,
    type_hint: &str,
    config: &ExtractionConfig,
) -> Result<Extraction, ExtractError> {
    let path = path.as_ref().to_path_buf();
    let type_hint = type_hint.to_string();
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract(&path, &type_hint, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract from bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] which is removed when
/// this function returns, on success, error or panic alike.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docextract::{extract_bytes, ExtractionConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("bom.csv")?;
/// let out = extract_bytes(&bytes, "text/csv", &ExtractionConfig::default())?;
/// println!("{}", out.content);
/// # Ok(())
/// # }
/// ```
pub fn extract_bytes(
    bytes: &[u8],
    type_hint: &str,
    config: &ExtractionConfig,
) -> Result<Extraction, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("docextract-upload-")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(tmp.path(), type_hint, config)
}

/// Extract and write the content to `output_path`.
///
/// Uses atomic write (temp file in the same directory + rename) so readers
/// never see a partial file.
pub fn extract_to_file(
    path: impl AsRef<Path>,
    type_hint: &str,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let extraction = extract(path, type_hint, config)?;
    let output_path = output_path.as_ref();
    let write_err = |source: std::io::Error| ExtractError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    let dir = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(extraction.content.as_bytes())
        .and_then(|_| tmp.write_all(b"\n"))
        .and_then(|_| tmp.flush())
        .map_err(write_err)?;
    tmp.persist(output_path).map_err(|e| write_err(e.error))?;

    info!("Wrote {}", output_path.display());
    Ok(extraction.stats)
}

/// Classify a document and, for PDFs, count pages and check for a text
/// layer. Never runs OCR.
pub fn inspect(
    path: impl AsRef<Path>,
    type_hint: &str,
    config: &ExtractionConfig,
) -> Result<Inspection, ExtractError> {
    let source = input::resolve_input(path.as_ref(), type_hint)?;

    let inspection = match source.kind() {
        DocumentKind::Pdf => {
            let backend = resolve_pdf_backend(config);
            let password = config.password.as_deref();
            let page_count = backend.page_count(source.path(), password)?;
            let has_text = text_layer::has_text_layer(backend.as_ref(), source.path(), password);
            Inspection {
                kind: DocumentKind::Pdf,
                strategy: if has_text { Strategy::Text } else { Strategy::Ocr },
                page_count: Some(page_count),
                has_text_layer: Some(has_text),
            }
        }
        DocumentKind::Image => Inspection {
            kind: DocumentKind::Image,
            strategy: Strategy::Ocr,
            page_count: None,
            has_text_layer: None,
        },
        kind @ (DocumentKind::Csv | DocumentKind::Spreadsheet) => Inspection {
            kind,
            strategy: Strategy::Tabular,
            page_count: None,
            has_text_layer: None,
        },
    };
    Ok(inspection)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Content and stats before final validation.
struct RawExtraction {
    strategy: Strategy,
    content: String,
    stats: ExtractionStats,
    /// Why the document as a whole produced nothing, if it failed outright.
    failure: Option<String>,
}

/// Resolve the PDF backend, most-specific first: a pre-built backend in the
/// config, otherwise pdfium bound from `pdfium_library_path` or the system.
fn resolve_pdf_backend(config: &ExtractionConfig) -> Arc<dyn PdfBackend> {
    if let Some(ref backend) = config.pdf_backend {
        return Arc::clone(backend);
    }
    Arc::new(PdfiumBackend::new(config.pdfium_library_path.clone()))
}

/// Resolve the OCR engine: a pre-built engine in the config, otherwise the
/// Tesseract CLI named by `tesseract_cmd`.
fn resolve_ocr_engine(config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    if let Some(ref engine) = config.ocr_engine {
        return Arc::clone(engine);
    }
    let mut engine = TesseractEngine::new(config.tesseract_cmd.clone());
    if let Some(ref dir) = config.tessdata_dir {
        engine = engine.with_tessdata_dir(dir.clone());
    }
    Arc::new(engine)
}

fn extract_pdf(
    source: &SourceDocument,
    config: &ExtractionConfig,
) -> Result<RawExtraction, ExtractError> {
    let backend = resolve_pdf_backend(config);
    let password = config.password.as_deref();
    debug!("PDF backend: {}", backend.name());

    if text_layer::has_text_layer(backend.as_ref(), source.path(), password) {
        info!("Text layer detected, reading embedded text");
        let layer = text_layer::extract_text_layer(backend.as_ref(), source.path(), password)?;
        if let Some(ref cb) = config.progress_callback {
            for e in &layer.page_errors {
                cb.on_page_error(e.page(), layer.total_pages, &e.to_string());
            }
        }
        return Ok(RawExtraction {
            strategy: Strategy::Text,
            content: layer.content,
            stats: ExtractionStats {
                total_pages: layer.total_pages,
                contributing_pages: layer.contributing_pages,
                page_errors: layer.page_errors,
                duration_ms: 0,
            },
            failure: None,
        });
    }

    info!("No text layer, rasterising for OCR");
    Ok(ocr_pdf(backend.as_ref(), source.path(), config))
}

/// Render → preprocess → recognise every page. Never fails: a document
/// that cannot be rasterised contributes nothing, and the empty result is
/// rejected later by final validation with the render error as its detail.
fn ocr_pdf(backend: &dyn PdfBackend, pdf_path: &Path, config: &ExtractionConfig) -> RawExtraction {
    let engine = resolve_ocr_engine(config);
    let render_options = RenderOptions {
        dpi: config.dpi,
        max_rendered_pixels: config.max_rendered_pixels,
        password: config.password.clone(),
    };
    let preprocess_options = PreprocessOptions::from(config);
    let cb = config.progress_callback.as_ref();

    let mut pages: Vec<String> = Vec::new();
    let mut page_errors: Vec<PageError> = Vec::new();

    let rendered = backend.render_pages(pdf_path, &render_options, &mut |page_num, total, page| {
        if let Some(cb) = cb {
            cb.on_page_start(page_num, total);
        }

        let text = page.and_then(|img| {
            recognize_page(engine.as_ref(), &img, &preprocess_options, config)
        });

        match text {
            Ok(text) => {
                if let Some(cb) = cb {
                    cb.on_page_complete(page_num, total, text.chars().count());
                }
                if text.is_empty() {
                    debug!("Page {}: no text recognised", page_num);
                } else {
                    pages.push(text);
                }
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(cb) = cb {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                page_errors.push(e);
            }
        }
    });

    let (total_pages, failure) = match rendered {
        Ok(n) => (n, None),
        Err(e) => {
            warn!("Rasterisation of {} failed: {}", pdf_path.display(), e);
            (0, Some(e.to_string()))
        }
    };

    RawExtraction {
        strategy: Strategy::Ocr,
        stats: ExtractionStats {
            total_pages,
            contributing_pages: pages.len(),
            page_errors,
            duration_ms: 0,
        },
        content: postprocess::join_pages(&pages, OCR_PAGE_SEPARATOR),
        failure,
    }
}

/// Preprocess and recognise one rendered page, returning cleaned text.
fn recognize_page(
    engine: &dyn OcrEngine,
    page: &PageImage,
    preprocess_options: &PreprocessOptions,
    config: &ExtractionConfig,
) -> Result<String, PageError> {
    let bitmap = preprocess(page, preprocess_options);
    engine
        .recognize(&bitmap, config.recognition_mode)
        .map(|raw| postprocess::clean_ocr_text(&raw))
        .map_err(|e| PageError::OcrFailed {
            page: page.page_num,
            detail: e.to_string(),
        })
}

fn extract_image(
    source: &SourceDocument,
    config: &ExtractionConfig,
) -> Result<RawExtraction, ExtractError> {
    let path = source.path();
    let decode_err = |detail: String| ExtractError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail,
    };

    // Format is sniffed from content so uploads without an extension decode.
    let image = image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?;
    debug!("Decoded {}: {}x{}", path.display(), image.width(), image.height());

    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(1, 1);
    }

    let engine = resolve_ocr_engine(config);
    let bitmap = preprocess(
        &PageImage { page_num: 1, image },
        &PreprocessOptions::from(config),
    );
    let raw = engine
        .recognize(&bitmap, config.recognition_mode)
        .map_err(|source| ExtractError::OcrFailed {
            path: path.to_path_buf(),
            source,
        })?;
    let text = postprocess::clean_ocr_text(&raw);

    if let Some(ref cb) = config.progress_callback {
        cb.on_page_complete(1, 1, text.chars().count());
    }

    Ok(RawExtraction {
        strategy: Strategy::Ocr,
        stats: ExtractionStats {
            total_pages: 1,
            contributing_pages: usize::from(!text.is_empty()),
            page_errors: Vec::new(),
            duration_ms: 0,
        },
        content: text,
        failure: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognitionMode;
    use crate::error::OcrError;
    use crate::pipeline::preprocess::PreprocessedImage;

    struct FixedOcr(&'static str);

    impl OcrEngine for FixedOcr {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _: &PreprocessedImage, _: RecognitionMode) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn configured_engine_wins_over_tesseract() {
        let config = ExtractionConfig::builder()
            .ocr_engine(Arc::new(FixedOcr("x")))
            .build()
            .unwrap();
        assert_eq!(resolve_ocr_engine(&config).name(), "fixed");
    }

    #[test]
    fn default_backends_are_pdfium_and_tesseract() {
        let config = ExtractionConfig::default();
        assert_eq!(resolve_pdf_backend(&config).name(), "pdfium");
        assert_eq!(resolve_ocr_engine(&config).name(), "tesseract");
    }

    #[test]
    fn recognize_page_cleans_engine_output() {
        let page = PageImage {
            page_num: 3,
            image: image::DynamicImage::new_luma8(4, 4),
        };
        let text = recognize_page(
            &FixedOcr("  Vcc 5V \n\n  GND\n\x0c"),
            &page,
            &PreprocessOptions::default(),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(text, "Vcc 5V\nGND");
    }

    #[test]
    fn image_ocr_failure_is_fatal() {
        struct Broken;
        impl OcrEngine for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn recognize(&self, _: &PreprocessedImage, _: RecognitionMode) -> Result<String, OcrError> {
                Err(OcrError::EngineFailed {
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::GrayImage::from_pixel(8, 8, image::Luma([255u8]))
            .save(&path)
            .unwrap();

        let config = ExtractionConfig::builder()
            .ocr_engine(Arc::new(Broken))
            .build()
            .unwrap();
        let err = extract(&path, "image/png", &config).unwrap_err();
        assert!(matches!(err, ExtractError::OcrFailed { .. }), "got: {err}");
    }

    #[test]
    fn undecodable_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"not an image").unwrap();
        let config = ExtractionConfig::builder()
            .ocr_engine(Arc::new(FixedOcr("never")))
            .build()
            .unwrap();
        let err = extract(&path, "png", &config).unwrap_err();
        assert!(matches!(err, ExtractError::ImageDecodeFailed { .. }), "got: {err}");
    }
}
