use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("fetch of {locator} returned {status}")]
    FetchStatus { locator: String, status: u16 },

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf is encrypted: {0}")]
    Encrypted(String),

    #[error("locator is not an extractable document: {0}")]
    UnsupportedLocator(String),

    #[error("extraction of {locator} timed out after {after:?}")]
    Timeout { locator: String, after: Duration },

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
