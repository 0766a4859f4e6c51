use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use digifolder_core::models::FileType;
use digifolder_core::{AppError, ErrorMetadata, LogLevel};

/// Error body printed to stderr when a command fails.
#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorReport {
    /// Service errors are reported by category; anything else is internal.
    pub fn from_error(err: &anyhow::Error) -> (Self, ExitCode) {
        match err.downcast_ref::<AppError>() {
            Some(app) => {
                match app.log_level() {
                    LogLevel::Debug => tracing::debug!(error = %app, "Command failed"),
                    LogLevel::Warn => tracing::warn!(error = %app, "Command failed"),
                    LogLevel::Error => tracing::error!(error = %app, causes = ?app.causes(), "Command failed"),
                }
                let report = ErrorReport {
                    error: app.error_code(),
                    message: app.client_message(),
                    recoverable: app.is_recoverable(),
                    causes: Vec::new(),
                };
                (report, ExitCode::from(app.category().exit_code()))
            }
            None => {
                tracing::error!(error = %err, "Command failed");
                let report = ErrorReport {
                    error: "INTERNAL_ERROR",
                    message: err.to_string(),
                    recoverable: false,
                    causes: err.chain().skip(1).map(|c| c.to_string()).collect(),
                };
                (report, ExitCode::FAILURE)
            }
        }
    }
}

/// File name to record for an upload: the explicit name, or the local file's name.
pub fn upload_name(local_path: &Path, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string()),
    }
}

/// Declared type for an upload: the explicit type, or the local file's extension.
pub fn upload_type(local_path: &Path, declared: Option<&str>) -> anyhow::Result<FileType> {
    match declared {
        Some(declared) => Ok(declared.parse::<FileType>()?),
        None => FileType::from_path(local_path).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot infer a file type for {}; pass --type",
                local_path.display()
            )
        }),
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON;
/// production runs log JSON lines.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
