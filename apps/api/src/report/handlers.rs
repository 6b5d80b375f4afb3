//! Axum route handlers for report export.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use crate::errors::AppError;
use crate::report::xlsx::write_workbook;
use crate::report::Report;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// POST /api/v1/reports/xlsx
///
/// Takes the (possibly operator-edited) report rows and returns the workbook.
pub async fn handle_export_xlsx(Json(report): Json<Report>) -> Result<Response, AppError> {
    if report.rows.is_empty() {
        return Err(AppError::Validation("Report has no rows".to_string()));
    }

    let bytes = write_workbook(&report.to_sheets())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build workbook: {e}")))?;

    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}
