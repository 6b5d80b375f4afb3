//! Axum route handlers for document uploads.

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;

use crate::content::documents::{combine_documents, extract_document, DocumentKind};
use crate::errors::AppError;

#[derive(Debug, Serialize)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub documents: Vec<ExtractedDocument>,
    /// All documents joined as one source block, ready for a group-shot item.
    pub combined_text: String,
}

/// POST /api/v1/documents/extract
///
/// Multipart upload of one or more `.pdf` / `.xlsx` files. Any file that cannot be read
/// fails the whole request so the item never reaches a generation-ready state.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let kind = DocumentKind::from_file_name(&file_name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {file_name}: {e}")))?;

        let name = file_name.clone();
        let text = tokio::task::spawn_blocking(move || extract_document(&name, &bytes, kind))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;

        documents.push(ExtractedDocument { file_name, text });
    }

    if documents.is_empty() {
        return Err(AppError::Validation("No files were uploaded".to_string()));
    }

    let pairs: Vec<(String, String)> = documents
        .iter()
        .map(|d| (d.file_name.clone(), d.text.clone()))
        .collect();
    let combined_text = combine_documents(&pairs);

    Ok(Json(ExtractResponse {
        documents,
        combined_text,
    }))
}
