//! Storage construction from configuration

use std::path::PathBuf;
use std::sync::Arc;

use digifolder_core::Config;

#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{S3Location, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};

/// Concrete store selected by the configuration, before anything is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
    Local {
        root: PathBuf,
        base_url: String,
    },
}

impl StorageTarget {
    /// S3 is the default backend. `S3_REGION` wins over `AWS_REGION`.
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let missing = |var: &str| StorageError::Config(format!("{} is not set", var));

        match config.storage_backend().unwrap_or(StorageBackend::S3) {
            StorageBackend::S3 => Ok(StorageTarget::S3 {
                bucket: config.s3_bucket().ok_or_else(|| missing("S3_BUCKET"))?.to_string(),
                region: config
                    .s3_region()
                    .or_else(|| config.aws_region())
                    .ok_or_else(|| missing("S3_REGION or AWS_REGION"))?
                    .to_string(),
                endpoint: config.s3_endpoint().map(str::to_string),
            }),
            StorageBackend::Local => Ok(StorageTarget::Local {
                root: config
                    .local_storage_path()
                    .map(PathBuf::from)
                    .ok_or_else(|| missing("LOCAL_STORAGE_PATH"))?,
                base_url: config
                    .local_storage_base_url()
                    .ok_or_else(|| missing("LOCAL_STORAGE_BASE_URL"))?
                    .to_string(),
            }),
        }
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            StorageTarget::S3 { .. } => StorageBackend::S3,
            StorageTarget::Local { .. } => StorageBackend::Local,
        }
    }

    /// Open the store. Fails if the backend was compiled out.
    pub async fn open(self) -> StorageResult<Arc<dyn Storage>> {
        tracing::debug!(backend = %self.backend(), "Opening storage backend");

        match self {
            #[cfg(feature = "storage-s3")]
            StorageTarget::S3 {
                bucket,
                region,
                endpoint,
            } => {
                let storage = S3Storage::new(S3Location {
                    bucket,
                    region,
                    endpoint,
                })
                .await?;
                Ok(Arc::new(storage))
            }
            #[cfg(feature = "storage-local")]
            StorageTarget::Local { root, base_url } => {
                Ok(Arc::new(LocalStorage::new(root, base_url).await?))
            }
            #[allow(unreachable_patterns)]
            other => Err(StorageError::Config(format!(
                "{} storage support is not compiled in",
                other.backend()
            ))),
        }
    }
}

/// Resolve and open the configured store.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    StorageTarget::from_config(config)?.open().await
}
