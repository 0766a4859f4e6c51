use digifolder_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

/// OCR client errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR is not configured: {0}")]
    Config(String),

    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OCR API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid OCR response: {0}")]
    InvalidResponse(String),

    #[error("OCR cache error: {0}")]
    Cache(String),
}

pub type OcrClientResult<T> = Result<T, OcrError>;

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::ImageNotFound(path) => {
                AppError::NotFound(format!("Image {} does not exist", path.display()))
            }
            OcrError::Config(msg) => AppError::Internal(format!("OCR is not configured: {}", msg)),
            OcrError::Api { message, .. } => AppError::Remote(message),
            other => AppError::Remote(format!("Failed to perform OCR: {}", other)),
        }
    }
}
