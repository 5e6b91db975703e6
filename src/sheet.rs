//! Two-column spreadsheet output
//!
//! Pairs the segmenter's number and body columns into rows and writes them
//! as CSV with a `No,Document` header.

use crate::segment::Segmented;
use crate::PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// One output row: line-item number and its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub no: String,
    pub text: String,
}

/// Pair the two columns line by line, padding the shorter one
///
/// Cells are trimmed and stripped of control characters spreadsheet tools
/// reject.
pub fn rows_from_segments(segmented: &Segmented) -> Vec<Row> {
    let numbers: Vec<&str> = segmented.numbers.lines().collect();
    let body: Vec<&str> = segmented.body.lines().collect();
    let len = numbers.len().max(body.len());

    (0..len)
        .map(|i| Row {
            no: sanitize_cell(numbers.get(i).copied().unwrap_or("")),
            text: sanitize_cell(body.get(i).copied().unwrap_or("")),
        })
        .collect()
}

/// Strip control characters that spreadsheet tools refuse in cells
pub fn sanitize_cell(text: &str) -> String {
    static ILLEGAL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

    ILLEGAL_RE.replace_all(text.trim(), "").to_string()
}

/// Write rows as a two-column CSV file with a `No,Document` header
pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[Row]) -> Result<(), PdfError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["No", "Document"])?;
    for row in rows {
        writer.write_record([row.no.as_str(), row.text.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmented(numbers: &str, body: &str) -> Segmented {
        Segmented {
            numbers: numbers.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_rows_pair_by_index() {
        let rows = rows_from_segments(&segmented("1.\n2.", "Alpha \nBeta"));
        assert_eq!(
            rows,
            vec![
                Row {
                    no: "1.".into(),
                    text: "Alpha".into()
                },
                Row {
                    no: "2.".into(),
                    text: "Beta".into()
                },
            ]
        );
    }

    #[test]
    fn test_rows_pad_shorter_column() {
        let rows = rows_from_segments(&segmented("1.", "Alpha\nBeta\nGamma"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].no, "1.");
        assert_eq!(rows[1].no, "");
        assert_eq!(rows[2].no, "");
        assert_eq!(rows[2].text, "Gamma");
    }

    #[test]
    fn test_rows_empty_input() {
        assert!(rows_from_segments(&segmented("", "")).is_empty());
    }

    #[test]
    fn test_sanitize_cell_strips_controls_keeps_unicode() {
        assert_eq!(sanitize_cell("a\x00b\x1fc"), "abc");
        assert_eq!(sanitize_cell("  padded  "), "padded");
        // Non-ASCII text survives; only control characters are illegal
        assert_eq!(sanitize_cell("café 문서"), "café 문서");
    }

    #[test]
    fn test_write_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let rows = vec![
            Row {
                no: "1.".into(),
                text: "Plain text".into(),
            },
            Row {
                no: "2.".into(),
                text: "Comma, inside".into(),
            },
        ];
        write_csv(&path, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "No,Document\n1.,Plain text\n2.,\"Comma, inside\"\n");
    }
}
