// ============================================================
// TABULAR INFRASTRUCTURE LAYER
// ============================================================
// Format sniffing, CSV and spreadsheet parsing, CSV export

mod csv_parser;
mod csv_writer;
mod format_sniffer;
mod xlsx_parser;

pub use csv_parser::CsvParser;
pub use csv_writer::CsvWriter;
pub use format_sniffer::{sniff_format, TabularFormat};
pub use xlsx_parser::XlsxParser;

use std::collections::HashMap;

/// Header names as pandas-style exports expect them: blank cells become
/// `Unnamed: <index>`, repeated names get a `.1`, `.2`, ... suffix.
pub(crate) fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let trimmed = name.as_ref().trim();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                trimmed.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers(["Order ID", "", " Amount ", "Amount", ""]);
        assert_eq!(
            headers,
            vec!["Order ID", "Unnamed: 1", "Amount", "Amount.1", "Unnamed: 4"]
        );
    }
}
