use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfEditError {
    #[error("Failed to parse PDF: {0}")]
    InvalidDocument(String),

    #[error("Invalid edits: {0}")]
    InvalidEdits(String),

    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Unusable font: {0}")]
    Font(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl From<lopdf::Error> for PdfEditError {
    fn from(e: lopdf::Error) -> Self {
        PdfEditError::OperationError(e.to_string())
    }
}
