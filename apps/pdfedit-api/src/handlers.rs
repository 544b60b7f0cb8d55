//! HTTP handlers for the PDF edit API

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use pdfedit_core::{
    extract_fonts as extract_embedded_fonts, EditInstruction, FontExtraction, PdfEditError,
    PdfEditor,
};
use tracing::info;

use crate::error::{ApiError, NO_EDITS_PROVIDED, NO_PDF_PROVIDED};
use crate::font_selection::select_font;
use crate::models::{HealthResponse, UploadForm};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Return every embedded font program in the uploaded PDF
pub async fn extract_fonts(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FontExtraction>, ApiError> {
    let form = UploadForm::read(multipart?).await?;
    let pdf = form.pdf.ok_or(ApiError::MissingField(NO_PDF_PROVIDED))?;

    let extraction = tokio::task::spawn_blocking(move || extract_embedded_fonts(&pdf)).await??;
    info!("Extracted {} fonts", extraction.fonts.len());

    Ok(Json(extraction))
}

/// Apply the uploaded edit list and return the modified PDF
pub async fn edit_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = UploadForm::read(multipart?).await?;
    let pdf = form.pdf.ok_or(ApiError::MissingField(NO_PDF_PROVIDED))?;

    // An empty list is valid and returns the document re-saved
    let edits_json = form
        .edits
        .filter(|json| !json.trim().is_empty())
        .ok_or(ApiError::MissingField(NO_EDITS_PROVIDED))?;
    let edits = EditInstruction::parse_list(&edits_json)?;
    info!("Received {} edits", edits.len());

    // Every page number is checked before any font is fetched
    let (editor, edits) = tokio::task::spawn_blocking(move || {
        let editor = PdfEditor::load(&pdf)?;
        editor.check_edits(&edits)?;
        Ok::<_, PdfEditError>((editor, edits))
    })
    .await??;
    info!("Loaded PDF with {} pages", editor.page_count());

    let mut fonts = Vec::with_capacity(edits.len());
    for edit in &edits {
        fonts.push(select_font(&state.fonts, edit).await);
    }

    let output = tokio::task::spawn_blocking(move || {
        let mut editor = editor;
        for (edit, font) in edits.iter().zip(fonts) {
            let applied = editor.apply(edit, font)?;
            info!(
                "Page {}: {:?} -> {:?} at ({}, {}) with {:?}",
                edit.page_number, edit.original_text, edit.new_text, edit.x, edit.y, applied
            );
        }
        editor.save()
    })
    .await??;

    let filename = format!("edited_{}.pdf", Local::now().format("%Y%m%d_%H%M%S"));
    info!("Returning {} ({} bytes)", filename, output.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        output,
    ))
}
