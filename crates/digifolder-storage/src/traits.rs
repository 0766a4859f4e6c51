//! Object store seam used by the file service

use async_trait::async_trait;
use digifolder_core::AppError;
use thiserror::Error;

use crate::StorageBackend;

/// Storage operation errors. Per-object failures carry the key involved.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to remove {key}: {reason}")]
    Remove { key: String, reason: String },

    #[error("No object stored under {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage is not configured: {0}")]
    Config(String),
}

impl StorageError {
    /// Key of the object the failure concerns, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            StorageError::Write { key, .. }
            | StorageError::Read { key, .. }
            | StorageError::Remove { key, .. }
            | StorageError::NotFound(key) => Some(key),
            _ => None,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Stored file {}", key)),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Object store holding the bytes of every library file.
///
/// Keys are owner-namespaced (see [`crate::keys`]). Implementations must
/// make `delete` idempotent: removing a missing object succeeds, which is
/// what lets interrupted deletions be replayed.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, replacing any existing object, and
    /// return the object's public URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Remove the object under `storage_key`. Missing objects are not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    fn public_url(&self, storage_key: &str) -> String;

    fn backend_type(&self) -> StorageBackend;

    /// Remove objects in order, stopping at the first failure. Objects
    /// removed before the failure stay removed.
    async fn delete_all(&self, storage_keys: &[String]) -> StorageResult<()> {
        for (index, key) in storage_keys.iter().enumerate() {
            if let Err(e) = self.delete(key).await {
                tracing::error!(
                    error = %e,
                    key = %key,
                    removed = index,
                    remaining = storage_keys.len() - index,
                    "Object removal stopped"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
