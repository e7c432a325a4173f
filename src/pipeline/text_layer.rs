//! Text-layer detection and direct text extraction.
//!
//! A PDF page counts as having a text layer when its embedded text is
//! non-empty after trimming whitespace. Detection walks pages in order and
//! stops at the first page with text; "no text layer" is only concluded after
//! every page was checked.
//!
//! Detection fails open: a PDF that cannot be opened, or any page whose text
//! cannot be read, is reported as having no text layer. The whole document
//! then goes down the OCR path, which can still recover the unreadable page.

use crate::error::{ExtractError, PageError};
use crate::pipeline::postprocess::join_pages;
use crate::pipeline::render::PdfBackend;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, warn};

/// Separator between text-layer pages.
pub const TEXT_PAGE_SEPARATOR: &str = "\n";

fn has_text(text: &str) -> bool {
    !text.trim().is_empty()
}

/// `true` if at least one page carries extractable text and no page before
/// it failed to read.
pub fn has_text_layer(backend: &dyn PdfBackend, pdf_path: &Path, password: Option<&str>) -> bool {
    let mut found = false;
    let mut read_failed = false;

    let scanned = backend.visit_page_text(pdf_path, password, &mut |page_num, _total, text| {
        match text {
            Ok(t) if has_text(&t) => {
                debug!("Text layer found on page {}", page_num);
                found = true;
                ControlFlow::Break(())
            }
            Ok(_) => ControlFlow::Continue(()),
            Err(e) => {
                warn!("{}", e);
                read_failed = true;
                ControlFlow::Break(())
            }
        }
    });

    match scanned {
        Ok(_) if read_failed => {
            warn!(
                "Unreadable page text in {}, falling back to OCR",
                pdf_path.display()
            );
            false
        }
        Ok(total) => {
            if !found {
                debug!("No text layer in {} pages", total);
            }
            found
        }
        Err(e) => {
            warn!(
                "Text-layer check failed for {}, falling back to OCR: {}",
                pdf_path.display(),
                e
            );
            false
        }
    }
}

/// Text of every page that has any, joined with `"\n"` in page order.
///
/// Pages without text contribute nothing; pages whose text cannot be read
/// are returned as [`PageError`]s alongside the content.
pub fn extract_text_layer(
    backend: &dyn PdfBackend,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<TextLayer, ExtractError> {
    let mut pages: Vec<String> = Vec::new();
    let mut page_errors: Vec<PageError> = Vec::new();

    let total_pages = backend.visit_page_text(pdf_path, password, &mut |_page_num, _total, text| {
        match text {
            Ok(t) if has_text(&t) => pages.push(t),
            Ok(_) => {}
            Err(e) => {
                warn!("{}", e);
                page_errors.push(e);
            }
        }
        ControlFlow::Continue(())
    })?;

    Ok(TextLayer {
        total_pages,
        contributing_pages: pages.len(),
        content: join_pages(&pages, TEXT_PAGE_SEPARATOR),
        page_errors,
    })
}

/// Result of [`extract_text_layer`].
#[derive(Debug, Clone)]
pub struct TextLayer {
    pub content: String,
    pub total_pages: usize,
    pub contributing_pages: usize,
    pub page_errors: Vec<PageError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::{PageVisitor, RenderOptions, TextVisitor};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed page texts; `None` entries are unreadable pages.
    struct FakeText {
        pages: Vec<Option<&'static str>>,
        visited: AtomicUsize,
        fail_open: bool,
    }

    impl FakeText {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                pages,
                visited: AtomicUsize::new(0),
                fail_open: false,
            }
        }
    }

    impl PdfBackend for FakeText {
        fn name(&self) -> &str {
            "fake"
        }

        fn page_count(&self, _: &Path, _: Option<&str>) -> Result<usize, ExtractError> {
            Ok(self.pages.len())
        }

        fn visit_page_text(
            &self,
            path: &Path,
            _: Option<&str>,
            visit: &mut TextVisitor<'_>,
        ) -> Result<usize, ExtractError> {
            if self.fail_open {
                return Err(ExtractError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: "bad xref".into(),
                });
            }
            let total = self.pages.len();
            for (i, page) in self.pages.iter().enumerate() {
                self.visited.fetch_add(1, Ordering::SeqCst);
                let text = page.map(str::to_string).ok_or(PageError::TextUnavailable {
                    page: i + 1,
                    detail: "broken content stream".into(),
                });
                if visit(i + 1, total, text).is_break() {
                    break;
                }
            }
            Ok(total)
        }

        fn render_pages(
            &self,
            _: &Path,
            _: &RenderOptions,
            _: &mut PageVisitor<'_>,
        ) -> Result<usize, ExtractError> {
            unreachable!("text-layer tests never render")
        }
    }

    fn path() -> PathBuf {
        PathBuf::from("datasheet.pdf")
    }

    #[test]
    fn detection_stops_at_first_page_with_text() {
        let backend = FakeText::new(vec![Some(""), Some("Vcc 5V"), Some("more")]);
        assert!(has_text_layer(&backend, &path(), None));
        assert_eq!(backend.visited.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn whitespace_only_pages_are_not_a_text_layer() {
        let backend = FakeText::new(vec![Some("  \n"), Some("")]);
        assert!(!has_text_layer(&backend, &path(), None));
        assert_eq!(backend.visited.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_page_document_has_no_text_layer() {
        let backend = FakeText::new(vec![]);
        assert!(!has_text_layer(&backend, &path(), None));
    }

    #[test]
    fn open_failure_fails_open_to_ocr() {
        let mut backend = FakeText::new(vec![Some("text")]);
        backend.fail_open = true;
        assert!(!has_text_layer(&backend, &path(), None));
    }

    #[test]
    fn unreadable_page_sends_document_to_ocr() {
        let backend = FakeText::new(vec![None, Some("Pin 1: GND")]);
        assert!(!has_text_layer(&backend, &path(), None));
        assert_eq!(backend.visited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unreadable_page_after_text_is_not_reached() {
        let backend = FakeText::new(vec![Some("Vcc 5V"), None]);
        assert!(has_text_layer(&backend, &path(), None));
        assert_eq!(backend.visited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn extraction_joins_pages_with_single_newline_and_skips_empty() {
        let backend = FakeText::new(vec![Some("Page one"), Some(""), Some("Page three")]);
        let layer = extract_text_layer(&backend, &path(), None).unwrap();
        assert_eq!(layer.content, "Page one\nPage three");
        assert_eq!(layer.total_pages, 3);
        assert_eq!(layer.contributing_pages, 2);
        assert!(layer.page_errors.is_empty());
    }

    #[test]
    fn extraction_reads_pages_before_the_first_text_page_too() {
        let backend = FakeText::new(vec![None, Some(""), Some("late text")]);
        let layer = extract_text_layer(&backend, &path(), None).unwrap();
        assert_eq!(layer.content, "late text");
        assert_eq!(layer.page_errors.len(), 1);
        assert_eq!(layer.page_errors[0].page(), 1);
    }

    #[test]
    fn extraction_propagates_open_failure() {
        let mut backend = FakeText::new(vec![Some("text")]);
        backend.fail_open = true;
        let err = extract_text_layer(&backend, &path(), None).unwrap_err();
        assert!(matches!(err, ExtractError::CorruptPdf { .. }));
    }
}
