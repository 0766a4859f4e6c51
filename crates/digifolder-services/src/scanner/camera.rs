use async_trait::async_trait;
use std::path::PathBuf;

use digifolder_core::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A still image produced by the camera, stored on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub path: PathBuf,
}

/// Image source for scanning.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// Take one picture. `Ok(None)` means the user cancelled.
    async fn capture(&self) -> Result<Option<CapturedImage>, AppError>;
}

/// Camera stand-in that "captures" an existing image file.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: Option<PathBuf>,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A camera whose every capture is cancelled.
    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn capture(&self) -> Result<Option<CapturedImage>, AppError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(AppError::NotFound(format!(
                "File does not exist: {}",
                path.display()
            )));
        }
        Ok(Some(CapturedImage { path: path.clone() }))
    }
}
