use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid font family: {0:?}")]
    InvalidFamily(String),

    #[error("Could not find font URL in stylesheet for {family} {weight}")]
    NoFontUrl { family: String, weight: u32 },

    #[error("Font request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Font cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid font URL prefix: {0}")]
    Pattern(#[from] regex::Error),
}
