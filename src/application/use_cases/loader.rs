// ============================================================
// LOADER USE CASE
// ============================================================
// Sniff the upload format and parse it into a raw sales table

use tracing::info;

use crate::domain::error::Result;
use crate::domain::sales::{SalesTable, Upload};
use crate::infrastructure::tabular::{sniff_format, CsvParser, TabularFormat, XlsxParser};

/// Reads uploaded files into raw tables. No type coercion happens here.
#[derive(Default)]
pub struct Loader {
    csv: CsvParser,
    spreadsheet: XlsxParser,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `upload`, preserving column names and row order.
    ///
    /// Fails with `FormatError` when the content is neither CSV text nor a
    /// readable workbook; no partial table is returned.
    pub fn load(&self, upload: &Upload) -> Result<(TabularFormat, SalesTable)> {
        let format = sniff_format(upload)?;

        let table = match format {
            TabularFormat::Csv => self.csv.parse_bytes(&upload.bytes)?,
            TabularFormat::Xlsx | TabularFormat::Xls => {
                self.spreadsheet.parse_bytes(&upload.bytes)?
            }
        };

        info!(
            filename = %upload.filename,
            ?format,
            bytes = upload.bytes.len(),
            rows = table.len(),
            columns = table.columns().len(),
            "Loaded upload"
        );

        Ok((format, table))
    }
}
