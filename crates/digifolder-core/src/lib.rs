//! DigiFolder Core Library
//!
//! Domain models, error types, configuration and the session context shared
//! by every DigiFolder component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod session;
pub mod storage_types;

pub use config::{BaseConfig, Config, DigiFolderConfig};
pub use error::{AppError, ErrorCategory, ErrorMetadata, LogLevel};
pub use session::SessionContext;
pub use storage_types::StorageBackend;
