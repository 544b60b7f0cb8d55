//! Error types for the PDF edit API

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfedit_core::PdfEditError;
use serde_json::json;
use thiserror::Error;

pub const NO_PDF_PROVIDED: &str = "No PDF file provided";
pub const NO_EDITS_PROVIDED: &str = "No edits provided";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Failed to parse PDF: {0}")]
    InvalidDocument(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PdfEditError> for ApiError {
    fn from(e: PdfEditError) -> Self {
        match e {
            PdfEditError::InvalidDocument(msg) => ApiError::InvalidDocument(msg),
            PdfEditError::InvalidEdits(_) | PdfEditError::PageOutOfRange { .. } => {
                ApiError::InvalidRequest(e.to_string())
            }
            PdfEditError::Font(_) | PdfEditError::OperationError(_) => {
                ApiError::Internal(anyhow::Error::new(e))
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidRequest(e.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::InvalidRequest(e.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(anyhow::anyhow!("PDF worker failed: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingField(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ApiError::InvalidDocument(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        if status.is_client_error() {
            tracing::warn!("Rejected request ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
