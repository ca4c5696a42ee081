// ============================================================
// FORMAT SNIFFER
// ============================================================
// Decide how to read an upload from its magic bytes and file name

use serde::Serialize;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::Upload;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF16_BOMS: [&[u8]; 2] = [&[0xFF, 0xFE], &[0xFE, 0xFF]];

/// How many leading bytes are inspected for binary content
const SNIFF_WINDOW: usize = 8192;

/// Input formats the loader accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    Csv,
    Xlsx,
    Xls,
}

impl TabularFormat {
    pub fn is_spreadsheet(&self) -> bool {
        matches!(self, TabularFormat::Xlsx | TabularFormat::Xls)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" | "txt" | "tsv" => Some(TabularFormat::Csv),
            "xlsx" | "xlsm" => Some(TabularFormat::Xlsx),
            "xls" => Some(TabularFormat::Xls),
            _ => None,
        }
    }

    fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(ZIP_MAGIC) {
            Some(TabularFormat::Xlsx)
        } else if bytes.starts_with(OLE2_MAGIC) {
            Some(TabularFormat::Xls)
        } else {
            None
        }
    }
}

/// Determine the format of `upload`.
///
/// Magic bytes and the declared extension must agree; an unknown or missing
/// extension defers to the content. Text without a spreadsheet signature is
/// CSV, anything else is a `FormatError`.
pub fn sniff_format(upload: &Upload) -> Result<TabularFormat> {
    if upload.bytes.is_empty() {
        return Err(AppError::FormatError(format!(
            "'{}' is empty",
            upload.filename
        )));
    }

    let declared = upload
        .extension()
        .as_deref()
        .and_then(TabularFormat::from_extension);
    let detected = TabularFormat::from_magic(&upload.bytes);

    match (declared, detected) {
        (Some(TabularFormat::Csv), Some(found)) => Err(AppError::FormatError(format!(
            "'{}' is named as CSV but contains a {:?} workbook",
            upload.filename, found
        ))),
        // xlsx and xls are both workbooks; the signature decides which
        (_, Some(found)) => Ok(found),
        (Some(declared), None) if declared.is_spreadsheet() => Err(AppError::FormatError(
            format!(
                "'{}' is named as a spreadsheet but has no workbook signature",
                upload.filename
            ),
        )),
        (_, None) => {
            if looks_binary(&upload.bytes) {
                Err(AppError::FormatError(format!(
                    "'{}' is neither CSV text nor a spreadsheet",
                    upload.filename
                )))
            } else {
                Ok(TabularFormat::Csv)
            }
        }
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    if UTF16_BOMS.iter().any(|bom| bytes.starts_with(bom)) {
        return false;
    }
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    window.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zip_bytes() -> Vec<u8> {
        let mut bytes = ZIP_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    #[test]
    fn test_csv_by_extension_and_content() {
        let upload = Upload::new("orders.csv", "Order ID,Amount\n1,10\n");
        assert_eq!(sniff_format(&upload).unwrap(), TabularFormat::Csv);

        let unnamed = Upload::new("upload", "Order ID,Amount\n1,10\n");
        assert_eq!(sniff_format(&unnamed).unwrap(), TabularFormat::Csv);
    }

    #[test]
    fn test_workbook_signature() {
        assert_eq!(
            sniff_format(&Upload::new("orders.xlsx", zip_bytes())).unwrap(),
            TabularFormat::Xlsx
        );
        assert_eq!(
            sniff_format(&Upload::new("blob", zip_bytes())).unwrap(),
            TabularFormat::Xlsx
        );
    }

    #[test]
    fn test_mislabeled_files_are_format_errors() {
        let err = sniff_format(&Upload::new("orders.csv", zip_bytes())).unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));

        let err = sniff_format(&Upload::new("orders.xlsx", "a,b\n1,2\n")).unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));
    }

    #[test]
    fn test_binary_and_empty_content_rejected() {
        let err = sniff_format(&Upload::new("orders.bin", vec![1u8, 0, 2, 0])).unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));

        let err = sniff_format(&Upload::new("orders.csv", Vec::new())).unwrap_err();
        assert!(matches!(err, AppError::FormatError(_)));
    }

    #[test]
    fn test_utf16_text_is_not_binary() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "a,b\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(
            sniff_format(&Upload::new("orders.csv", bytes)).unwrap(),
            TabularFormat::Csv
        );
    }
}
