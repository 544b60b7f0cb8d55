//! Request and response shapes

use axum::extract::Multipart;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Fields of a `multipart/form-data` upload. Unknown fields are ignored.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub pdf: Option<Vec<u8>>,
    pub edits: Option<String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("pdf") => form.pdf = Some(field.bytes().await?.to_vec()),
                Some("edits") => form.edits = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }
}
