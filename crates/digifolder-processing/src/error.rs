use digifolder_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content is not suitable for CSV conversion")]
    NotTabular,

    #[error("No pages to combine")]
    NoPages,

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InputNotFound(path) => {
                AppError::NotFound(format!("File does not exist: {}", path.display()))
            }
            ConversionError::NotTabular => AppError::Conversion(err.to_string()),
            ConversionError::NoPages => AppError::InvalidInput(err.to_string()),
            other => AppError::Conversion(other.to_string()),
        }
    }
}
