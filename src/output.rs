//! Output types returned by the extraction entry points.

use crate::error::PageError;
use crate::pipeline::input::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the content of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Read from the PDF's embedded text layer.
    Text,
    /// Recovered by rasterising and recognising page images.
    Ocr,
    /// Serialised from a CSV or spreadsheet table.
    Tabular,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Text => "text",
            Strategy::Ocr => "ocr",
            Strategy::Tabular => "tabular",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful result of [`crate::extract`].
///
/// `content` is trimmed and never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub strategy: Strategy,
    pub kind: DocumentKind,
    pub content: String,
    pub stats: ExtractionStats,
}

/// Per-document bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages (or images) the pipeline looked at. 0 for tabular input.
    pub total_pages: usize,
    /// Pages whose text made it into `content`.
    pub contributing_pages: usize,
    /// Pages that failed and were skipped, in page order.
    pub page_errors: Vec<PageError>,
    pub duration_ms: u64,
}

impl ExtractionStats {
    pub fn degraded_pages(&self) -> usize {
        self.page_errors.len()
    }
}

/// What [`crate::inspect`] learns about a file without running OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub kind: DocumentKind,
    /// Strategy `extract` would choose.
    pub strategy: Strategy,
    /// Page count, PDFs only.
    pub page_count: Option<usize>,
    /// Text-layer presence, PDFs only.
    pub has_text_layer: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Strategy::Ocr).unwrap(), "\"ocr\"");
        assert_eq!(Strategy::Tabular.to_string(), "tabular");
    }

    #[test]
    fn extraction_round_trips_through_json() {
        let out = Extraction {
            strategy: Strategy::Text,
            kind: DocumentKind::Pdf,
            content: "Resistor 10kΩ".into(),
            stats: ExtractionStats {
                total_pages: 2,
                contributing_pages: 1,
                page_errors: vec![PageError::TextUnavailable {
                    page: 2,
                    detail: "bad stream".into(),
                }],
                duration_ms: 12,
            },
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"strategy\":\"text\""));
        let back: Extraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats.degraded_pages(), 1);
        assert_eq!(back.content, out.content);
    }
}
