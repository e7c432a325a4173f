//! CSV and spreadsheet extraction.
//!
//! Both formats are loaded whole into a header + rows table and rendered as
//! fixed-width text without row indices:
//!
//! ```text
//! Part  Value  Tolerance
//! R1    10k    1%
//! C12   100nF  10%
//! ```
//!
//! Any parse error fails the whole file. Unlike PDF pages there is no
//! natural unit to degrade to, and a table with silently dropped rows is
//! worse than no table.

use crate::error::ExtractError;
use crate::pipeline::input::DocumentKind;
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const COLUMN_GAP: &str = "  ";

/// Header row plus data rows, all cells already stringified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Blank header cells become `Unnamed: <index>`.
    fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim().to_string();
                if h.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    h
                }
            })
            .collect();
        Self { headers, rows }
    }

    /// Fixed-width rendering: left-aligned cells, two-space gaps, no index.
    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render_line = |cells: &[String]| -> String {
            let mut line = String::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    line.push_str(COLUMN_GAP);
                }
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                line.push_str(cell);
                let pad = width.saturating_sub(cell.chars().count());
                line.push_str(&" ".repeat(pad));
            }
            line.trim_end().to_string()
        };

        std::iter::once(render_line(&self.headers))
            .chain(self.rows.iter().map(|r| render_line(r)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Load `path` as `kind` (Csv or Spreadsheet) and render it as text.
pub fn extract_tabular(path: &Path, kind: DocumentKind) -> Result<String, ExtractError> {
    let table = match kind {
        DocumentKind::Csv => read_csv(path)?,
        DocumentKind::Spreadsheet => read_spreadsheet(path)?,
        other => {
            return Err(ExtractError::Internal(format!(
                "tabular extractor called for {} input",
                other
            )))
        }
    };
    debug!(
        "Table {}: {} columns, {} rows",
        path.display(),
        table.headers.len(),
        table.rows.len()
    );
    Ok(table.render())
}

fn parse_failure(path: &Path, detail: impl ToString) -> ExtractError {
    ExtractError::TabularParseFailure {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Comma-delimited, header row required, every record the same width.
pub fn read_csv(path: &Path) -> Result<Table, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| parse_failure(path, e))?;

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_failure(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(parse_failure(path, "no columns to parse"));
    }
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{FEFF}') {
            *first = stripped.to_string();
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_failure(path, e))?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    Ok(Table::new(headers, rows))
}

/// First worksheet, first row as header. Format is sniffed from content, so
/// an upload stored without its extension still opens.
pub fn read_spreadsheet(path: &Path) -> Result<Table, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| parse_failure(path, e))?;
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| parse_failure(path, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_failure(path, "workbook contains no sheets"))?
        .map_err(|e| parse_failure(path, e))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = match rows.next() {
        Some(h) => h,
        None => return Ok(Table::default()),
    };
    Ok(Table::new(headers, rows.collect()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => date_text(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string().trim().to_string(),
    }
}

/// `YYYY-MM-DD HH:MM:SS` for date-formatted cells; durations and serials
/// outside the calendar keep their numeric value.
fn date_text(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(naive) if dt.is_datetime() => naive.to_string(),
        _ => dt.as_f64().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn renders_fixed_width_without_index() {
        let f = csv_file("Part,Value,Tolerance\nR1,10k,1%\nC12,100nF,10%\n");
        let text = extract_tabular(f.path(), DocumentKind::Csv).unwrap();
        assert_eq!(
            text,
            "Part  Value  Tolerance\n\
             R1    10k    1%\n\
             C12   100nF  10%"
        );
    }

    #[test]
    fn header_only_csv_renders_header() {
        let f = csv_file("a,b\n");
        assert_eq!(extract_tabular(f.path(), DocumentKind::Csv).unwrap(), "a  b");
    }

    #[test]
    fn blank_headers_are_named_like_pandas() {
        let f = csv_file(",qty\nx,1\n");
        let text = extract_tabular(f.path(), DocumentKind::Csv).unwrap();
        assert!(text.starts_with("Unnamed: 0  qty"), "got: {text:?}");
    }

    #[test]
    fn ragged_csv_is_a_parse_failure() {
        let f = csv_file("a,b\n1,2,3\n");
        let err = extract_tabular(f.path(), DocumentKind::Csv).unwrap_err();
        assert!(matches!(err, ExtractError::TabularParseFailure { .. }), "got: {err}");
    }

    #[test]
    fn empty_csv_is_a_parse_failure() {
        let f = csv_file("");
        let err = extract_tabular(f.path(), DocumentKind::Csv).unwrap_err();
        assert!(err.to_string().contains("no columns"), "got: {err}");
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let f = csv_file("\u{FEFF}id,name\n1,x\n");
        let text = extract_tabular(f.path(), DocumentKind::Csv).unwrap();
        assert!(text.starts_with("id"), "got: {text:?}");
    }

    #[test]
    fn unicode_width_counts_chars_not_bytes() {
        let table = Table::new(
            vec!["R".into(), "note".into()],
            vec![vec!["10kΩ".into(), "x".into()], vec!["1k".into(), "y".into()]],
        );
        assert_eq!(table.render(), "R     note\n10kΩ  x\n1k    y");
    }

    #[test]
    fn corrupt_spreadsheet_is_a_parse_failure() {
        let mut f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        f.write_all(b"this is not a zip archive").unwrap();
        let err = extract_tabular(f.path(), DocumentKind::Spreadsheet).unwrap_err();
        assert!(matches!(err, ExtractError::TabularParseFailure { .. }), "got: {err}");
    }

    #[test]
    fn empty_table_renders_empty() {
        assert_eq!(Table::default().render(), "");
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn first_worksheet_is_read_with_header_row() {
        let table = read_spreadsheet(&fixture("bom.xlsx")).unwrap();
        assert_eq!(table.headers, vec!["Ref", "Value", "Qty", "Received"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["R1", "10k", "4", "2024-01-01 00:00:00"],
                vec!["C3", "100nF", "12.5", "2024-01-02 00:00:00"],
            ]
        );
    }

    #[test]
    fn empty_worksheet_is_an_empty_table() {
        let table = read_spreadsheet(&fixture("empty_sheet.xlsx")).unwrap();
        assert_eq!(table, Table::default());
    }

    #[test]
    fn workbook_without_sheets_is_a_parse_failure() {
        let err = read_spreadsheet(&fixture("no_sheets.xlsx")).unwrap_err();
        assert!(matches!(err, ExtractError::TabularParseFailure { .. }), "got: {err}");
    }

    #[test]
    fn date_cells_render_as_calendar_time() {
        let date = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(cell_text(&Data::DateTime(date)), "2024-01-01 12:00:00");
    }

    #[test]
    fn duration_cells_keep_their_value() {
        let span = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(cell_text(&Data::DateTime(span)), "1.5");
    }

    #[test]
    fn iso_cells_pass_through() {
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-03-01T08:30:00".into())),
            "2024-03-01T08:30:00"
        );
        assert_eq!(cell_text(&Data::DurationIso("PT1H30M".into())), "PT1H30M");
    }

    #[test]
    fn numbers_and_strings_are_trimmed_display() {
        assert_eq!(cell_text(&Data::Float(4.0)), "4");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::String("  10k ".into())), "10k");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
