//! Input resolution: validate the file and classify its extraction strategy.
//!
//! The type hint is whatever the upstream collaborator recorded at upload
//! time — a MIME type (`application/pdf`), an extension (`.xlsx`), or a
//! loose label (`spreadsheet`). Matching is a case-insensitive substring
//! test in a fixed precedence order, so `application/vnd.ms-excel` and
//! `XLSX` both land on the spreadsheet extractor. When the hint is generic
//! (`application/octet-stream`), a `.xlsx` / `.xls` extension on the path
//! still routes to the spreadsheet extractor.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which extractor family a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
    Csv,
    Spreadsheet,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => "image",
            DocumentKind::Csv => "csv",
            DocumentKind::Spreadsheet => "spreadsheet",
        })
    }
}

const IMAGE_MARKERS: &[&str] = &["image", "png", "jpeg", "jpg"];
const SPREADSHEET_MARKERS: &[&str] = &["spreadsheet", "excel", "xlsx", "xls"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// A validated input file. Immutable for the duration of one extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    type_hint: String,
    kind: DocumentKind,
}

impl SourceDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn type_hint(&self) -> &str {
        &self.type_hint
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// Validate `path` and classify it.
///
/// Existence is checked before classification, so a missing file is always
/// reported as [`ExtractError::InputNotFound`] whatever the hint says.
pub fn resolve_input(path: &Path, type_hint: &str) -> Result<SourceDocument, ExtractError> {
    ensure_readable(path)?;

    let kind = classify(path, type_hint).ok_or_else(|| ExtractError::UnsupportedType {
        path: path.to_path_buf(),
        type_hint: type_hint.to_string(),
    })?;

    debug!("Resolved {} as {} (hint {:?})", path.display(), kind, type_hint);
    Ok(SourceDocument {
        path: path.to_path_buf(),
        type_hint: type_hint.to_string(),
        kind,
    })
}

/// Map a type hint (and, for spreadsheets, the path extension) to a kind.
///
/// Precedence: pdf, image, csv, spreadsheet. Returns `None` when nothing
/// matches.
pub fn classify(path: &Path, type_hint: &str) -> Option<DocumentKind> {
    let hint = type_hint.to_lowercase();

    if hint.contains("pdf") {
        return Some(DocumentKind::Pdf);
    }
    if IMAGE_MARKERS.iter().any(|m| hint.contains(m)) {
        return Some(DocumentKind::Image);
    }
    if hint.contains("csv") {
        return Some(DocumentKind::Csv);
    }
    if SPREADSHEET_MARKERS.iter().any(|m| hint.contains(m)) || has_spreadsheet_extension(path) {
        return Some(DocumentKind::Spreadsheet);
    }
    None
}

fn has_spreadsheet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// The file must exist, be a regular file and be openable for reading.
fn ensure_readable(path: &Path) -> Result<(), ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ExtractError::InputNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(path: &str, hint: &str) -> Option<DocumentKind> {
        classify(Path::new(path), hint)
    }

    #[test]
    fn classify_mime_types() {
        assert_eq!(kind("a", "application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(kind("a", "image/png"), Some(DocumentKind::Image));
        assert_eq!(kind("a", "IMAGE/JPEG"), Some(DocumentKind::Image));
        assert_eq!(kind("a", "text/csv"), Some(DocumentKind::Csv));
        assert_eq!(
            kind(
                "a",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            Some(DocumentKind::Spreadsheet)
        );
        assert_eq!(
            kind("a", "application/vnd.ms-excel"),
            Some(DocumentKind::Spreadsheet)
        );
    }

    #[test]
    fn classify_bare_extensions_as_hints() {
        assert_eq!(kind("a", ".PDF"), Some(DocumentKind::Pdf));
        assert_eq!(kind("a", "jpg"), Some(DocumentKind::Image));
        assert_eq!(kind("a", "xls"), Some(DocumentKind::Spreadsheet));
    }

    #[test]
    fn spreadsheet_hint_wins_over_disagreeing_extension() {
        assert_eq!(kind("report.txt", "xlsx"), Some(DocumentKind::Spreadsheet));
        assert_eq!(
            kind("upload.bin", "spreadsheet"),
            Some(DocumentKind::Spreadsheet)
        );
    }

    #[test]
    fn spreadsheet_extension_wins_over_generic_hint() {
        assert_eq!(
            kind("Book1.XLSX", "application/octet-stream"),
            Some(DocumentKind::Spreadsheet)
        );
        assert_eq!(kind("legacy.xls", ""), Some(DocumentKind::Spreadsheet));
    }

    #[test]
    fn other_extensions_do_not_rescue_a_generic_hint() {
        assert_eq!(kind("scan.pdf", "application/octet-stream"), None);
        assert_eq!(kind("notes.docx", "application/msword"), None);
    }

    #[test]
    fn precedence_is_pdf_first() {
        assert_eq!(kind("a", "pdf-image"), Some(DocumentKind::Pdf));
        assert_eq!(kind("a", "image/csv-preview"), Some(DocumentKind::Image));
    }

    #[test]
    fn missing_file_is_input_not_found_even_for_unknown_hints() {
        let err = resolve_input(Path::new("/definitely/not/here.bin"), "???").unwrap_err();
        assert!(matches!(err, ExtractError::InputNotFound { .. }));
    }

    #[test]
    fn directory_is_not_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path(), "pdf").unwrap_err();
        assert!(matches!(err, ExtractError::InputNotFound { .. }));
    }

    #[test]
    fn unknown_hint_on_existing_file_is_unsupported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_input(file.path(), "application/zip").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType { .. }));
    }

    #[test]
    fn resolve_keeps_hint_and_kind() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let doc = resolve_input(file.path(), "text/csv").unwrap();
        assert_eq!(doc.kind(), DocumentKind::Csv);
        assert_eq!(doc.type_hint(), "text/csv");
        assert_eq!(doc.path(), file.path());
    }
}
