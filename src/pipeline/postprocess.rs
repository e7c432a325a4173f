//! Post-processing: OCR text cleanup, page assembly and final validation.
//!
//! ## Rules
//!
//! 1. [`clean_ocr_text`] runs on every OCR page before assembly. It strips
//!    per-line padding and drops blank lines, which is where most Tesseract
//!    line noise ends up. Content is never reordered.
//! 2. [`join_pages`] concatenates page texts with a strategy-specific
//!    separator: `"\n"` for text-layer pages, `"\n\n"` for OCR pages. Pages
//!    with no text are skipped rather than left as empty placeholders.
//! 3. [`finalize`] trims the assembled content and rejects an empty result.
//!    Empty output looks the same as a misconfigured extractor, so it is an
//!    error and never a successful empty string.

use crate::error::ExtractError;
use crate::output::Strategy;
use std::path::Path;

/// Separator between OCR'd pages.
pub const OCR_PAGE_SEPARATOR: &str = "\n\n";

// ── Rule 1: OCR line cleanup ─────────────────────────────────────────────────

/// Trim every line and drop the ones that end up empty.
pub fn clean_ocr_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 2: Page assembly ────────────────────────────────────────────────────

/// Join non-empty page texts in order.
pub fn join_pages<S: AsRef<str>>(pages: &[S], separator: &str) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

// ── Rule 3: Final validation ─────────────────────────────────────────────────

/// Trim `content`; an empty result becomes [`ExtractError::EmptyContent`]
/// carrying `failure` as its detail.
pub fn finalize(
    content: &str,
    path: &Path,
    strategy: Strategy,
    failure: Option<String>,
) -> Result<String, ExtractError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::EmptyContent {
            path: path.to_path_buf(),
            strategy,
            detail: failure,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_trims_lines_and_drops_blanks() {
        let raw = "  Resistor 10kΩ  \n\n   \n\tTolerance 1%\n";
        assert_eq!(clean_ocr_text(raw), "Resistor 10kΩ\nTolerance 1%");
    }

    #[test]
    fn clean_handles_crlf() {
        assert_eq!(clean_ocr_text("a\r\n\r\nb\r\n"), "a\nb");
    }

    #[test]
    fn clean_keeps_line_order() {
        assert_eq!(clean_ocr_text("z\ny\nx"), "z\ny\nx");
    }

    #[test]
    fn clean_of_noise_only_is_empty() {
        // Tesseract ends every page with a form feed.
        assert_eq!(clean_ocr_text(" \n\x0c\n  \n"), "");
        assert_eq!(clean_ocr_text("\n \n\t\n"), "");
    }

    #[test]
    fn join_skips_empty_pages() {
        let pages = ["Page 1", "", "Page 3"];
        assert_eq!(join_pages(&pages, OCR_PAGE_SEPARATOR), "Page 1\n\nPage 3");
        assert_eq!(join_pages(&pages, "\n"), "Page 1\nPage 3");
    }

    #[test]
    fn join_of_nothing_is_empty() {
        let pages: [String; 0] = [];
        assert_eq!(join_pages(&pages, OCR_PAGE_SEPARATOR), "");
    }

    #[test]
    fn finalize_trims() {
        let out = finalize("\n  text  \n", Path::new("a.pdf"), Strategy::Text, None).unwrap();
        assert_eq!(out, "text");
    }

    #[test]
    fn finalize_rejects_whitespace_only() {
        let err = finalize(" \n\t ", Path::new("blank.pdf"), Strategy::Ocr, None).unwrap_err();
        match err {
            ExtractError::EmptyContent {
                path,
                strategy,
                detail,
            } => {
                assert_eq!(path, Path::new("blank.pdf"));
                assert_eq!(strategy, Strategy::Ocr);
                assert_eq!(detail, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn finalize_keeps_failure_as_detail() {
        let err = finalize(
            "",
            Path::new("scan.pdf"),
            Strategy::Ocr,
            Some("PDF 'scan.pdf' is corrupt: trailer not found".into()),
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("trailer not found"), "got: {err}");
    }

    #[test]
    fn finalize_ignores_failure_when_content_survives() {
        let out = finalize("text", Path::new("a.pdf"), Strategy::Ocr, Some("late".into())).unwrap();
        assert_eq!(out, "text");
    }
}
