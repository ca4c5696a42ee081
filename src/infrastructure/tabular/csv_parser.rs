// ============================================================
// CSV PARSER
// ============================================================
// Parse uploaded CSV bytes with encoding and delimiter detection

use std::borrow::Cow;

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, WINDOWS_1252};
use tracing::debug;

use super::normalize_headers;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::{Cell, SalesTable};

/// CSV parser with encoding and delimiter detection; values are trimmed
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw upload bytes into a table
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<SalesTable> {
        let content = decode_text(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<SalesTable> {
        let delimiter = Self::detect_delimiter(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::FormatError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::FormatError(
                "CSV has no header row".to_string(),
            ));
        }

        let columns = normalize_headers(headers.iter());
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::FormatError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            // Blank lines carry no record
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            if record.len() > columns.len() {
                return Err(AppError::FormatError(format!(
                    "CSV row {} has {} fields, header has {}",
                    index + 1,
                    record.len(),
                    columns.len()
                )));
            }

            rows.push(record.iter().map(Cell::from_raw).collect());
        }

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            delimiter = %(delimiter as char),
            "Parsed CSV upload"
        );

        Ok(SalesTable::new(columns, rows))
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Decode upload bytes: BOM first, then UTF-8, then Windows-1252.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("Upload is not valid UTF-8, decoding as Windows-1252");
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "Order ID,Amount,Qty\n405-1,647.62,1\n405-2,406,1";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["Order ID", "Amount", "Qty"]);
        assert_eq!(table.cell(0, "Amount"), Some(&Cell::Text("647.62".to_string())));
    }

    #[test]
    fn test_missing_values_and_short_rows() {
        let content = "Order ID,Amount,Qty\n405-1,,1\n405-2,406";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.cell(0, "Amount"), Some(&Cell::Null));
        assert_eq!(table.cell(1, "Qty"), Some(&Cell::Null));
    }

    #[test]
    fn test_row_longer_than_header_is_format_error() {
        let content = "Order ID,Amount,Qty\n1,10,1\n1,10,1,EXTRA,MORE\n";
        let err = CsvParser::new().parse_content(content).unwrap_err();

        match err {
            AppError::FormatError(msg) => {
                assert!(msg.contains("row 2"), "{}", msg);
                assert!(msg.contains("5 fields"), "{}", msg);
            }
            other => panic!("expected FormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_header_becomes_placeholder() {
        let content = "index,Amount,\n0,10,x";
        let table = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(table.columns(), &["index", "Amount", "Unnamed: 2"]);
    }

    #[test]
    fn test_header_only_blank_is_format_error() {
        let err = CsvParser::new().parse_content(",,\n1,2,3").unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));

        let err = CsvParser::new().parse_content("").unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvParser::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(CsvParser::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(CsvParser::detect_delimiter("a\tb\nc\td"), b'\t');
    }

    #[test]
    fn test_decode_windows_1252_and_bom() {
        // "Caf\xe9" is "Café" in Windows-1252
        assert_eq!(decode_text(b"Caf\xe9"), "Café");
        assert_eq!(decode_text(b"\xEF\xBB\xBFAmount"), "Amount");
    }
}
