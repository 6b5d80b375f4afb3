//! Release-document text extraction (PDF and XLSX uploads).

use thiserror::Error;
use tracing::info;

use crate::content::text::{normalize_source_text, truncate_chars, MAX_SOURCE_CHARS};
use crate::report::xlsx::{read_workbook, XlsxError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0} (upload a .pdf or .xlsx file)")]
    UnsupportedFormat(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error("No text could be extracted from {0}")]
    Empty(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Spreadsheet,
}

impl DocumentKind {
    /// Detects the kind from the file extension. Legacy binary `.xls` is not supported.
    pub fn from_file_name(name: &str) -> Result<Self, ExtractionError> {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".xlsx") {
            Ok(DocumentKind::Spreadsheet)
        } else {
            Err(ExtractionError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// Extracts normalised text (blank runs collapsed, capped length) from a document.
pub fn extract_document(
    file_name: &str,
    bytes: &[u8],
    kind: DocumentKind,
) -> Result<String, ExtractionError> {
    let raw = match kind {
        // pdf-extract panics on some malformed font tables instead of returning an error
        DocumentKind::Pdf => std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| ExtractionError::Pdf("parser aborted on malformed input".to_string()))?
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        DocumentKind::Spreadsheet => spreadsheet_text(bytes)?,
    };

    let text = normalize_source_text(raw.trim());
    if text.is_empty() {
        return Err(ExtractionError::Empty(file_name.to_string()));
    }
    info!("Extracted {} chars from {file_name}", text.chars().count());
    Ok(text)
}

/// One `[Sheet: name]` header per sheet, then each non-blank row as `a | b | c`.
fn spreadsheet_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let sheets = read_workbook(bytes)?;
    let mut lines = Vec::new();
    for sheet in sheets {
        lines.push(format!("[Sheet: {}]", sheet.name));
        for row in sheet.rows {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            lines.push(row.join(" | ").trim().to_string());
        }
    }
    Ok(lines.join("\n"))
}

/// Joins several extracted documents into one source block for a group shot.
pub fn combine_documents(documents: &[(String, String)]) -> String {
    let combined = documents
        .iter()
        .map(|(name, text)| format!("[Document: {name}]\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&combined, MAX_SOURCE_CHARS)
}
