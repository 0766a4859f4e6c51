//! Error types module
//!
//! All service-level failures are unified under `AppError`. Every variant
//! belongs to one [`ErrorCategory`], which decides how the failure is shown.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected outcomes such as validation failures or expired sessions
    Debug,
    /// User-driven aborts and remote hiccups
    Warn,
    /// Failures someone should look at
    Error,
}

/// Describes how an error should be presented to whoever triggered the action.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same action may succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// User-facing bucket of a failure. Each bucket is presented the same way
/// regardless of which layer raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Camera access refused, or the user backed out
    Permission,
    /// Missing, expired or rejected session
    Authentication,
    /// Bad input, missing files, unsupported conversions
    Validation,
    /// OCR service, downloads, object store, row store
    Remote,
    Generic,
}

impl ErrorCategory {
    /// Process exit status used by the CLI for this category.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCategory::Generic => 1,
            ErrorCategory::Validation => 2,
            ErrorCategory::Authentication => 3,
            ErrorCategory::Permission => 4,
            ErrorCategory::Remote => 5,
        }
    }
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::PermissionDenied(_) | AppError::Cancelled(_) => ErrorCategory::Permission,
            AppError::Unauthorized(_) => ErrorCategory::Authentication,
            AppError::NotFound(_) | AppError::InvalidInput(_) | AppError::Conversion(_) => {
                ErrorCategory::Validation
            }
            AppError::Remote(_) | AppError::Storage(_) | AppError::Database(_) => {
                ErrorCategory::Remote
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => ErrorCategory::Generic,
        }
    }

    /// Messages of the underlying causes, outermost first, at most five.
    pub fn causes(&self) -> Vec<String> {
        use std::error::Error;

        std::iter::successors(self.source(), |&err| err.source())
            .take(5)
            .map(|err| err.to_string())
            .collect()
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Cancelled(_) => "CANCELLED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Conversion(_) => "CONVERSION_FAILED",
            AppError::Remote(_) => "REMOTE_FAILURE",
            AppError::Storage(_) => "STORAGE_FAILURE",
            AppError::Database(_) => "DATABASE_FAILURE",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    /// Remote hiccups and user cancellations can simply be retried.
    fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Cancelled(_)) || self.category() == ErrorCategory::Remote
    }

    fn log_level(&self) -> LogLevel {
        match self.category() {
            ErrorCategory::Authentication | ErrorCategory::Validation => LogLevel::Debug,
            ErrorCategory::Permission => LogLevel::Warn,
            ErrorCategory::Remote => match self {
                AppError::Remote(_) => LogLevel::Warn,
                _ => LogLevel::Error,
            },
            ErrorCategory::Generic => LogLevel::Error,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::PermissionDenied(ref msg) => msg.clone(),
            AppError::Cancelled(ref msg) => msg.clone(),
            AppError::Unauthorized(_) => "Authentication error. Please try again.".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Conversion(ref msg) => msg.clone(),
            AppError::Remote(ref msg) => msg.clone(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Internal(_) => "An unexpected error occurred".to_string(),
            AppError::InternalWithSource { ref message, .. } => {
                if message.is_empty() {
                    "An unexpected error occurred".to_string()
                } else {
                    message.clone()
                }
            }
        }
    }
}
