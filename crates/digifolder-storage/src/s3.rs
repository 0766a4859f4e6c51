//! S3-compatible object store (AWS, MinIO, or the hosted backend's bucket)

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{Error as ObjectStoreError, ObjectStoreExt, PutPayload};

use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;

/// Where the bucket lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers. `None` means AWS.
    pub endpoint: Option<String>,
}

impl S3Location {
    /// Path-style URL on a custom endpoint, virtual-hosted style on AWS.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    store: AmazonS3,
    location: S3Location,
}

impl S3Storage {
    /// Credentials come from the usual `AWS_*` environment variables.
    pub async fn new(location: S3Location) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(location.region.clone())
            .with_bucket_name(location.bucket.clone());

        if let Some(endpoint) = &location.endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self { store, location })
    }

    pub fn location(&self) -> &S3Location {
        &self.location
    }

    fn object_path(storage_key: &str) -> StorageResult<ObjectPath> {
        validate_key(storage_key)?;
        ObjectPath::parse(storage_key).map_err(|e| StorageError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = Self::object_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.store
            .put(&path, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.location.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    "S3 put failed"
                );
                StorageError::Write {
                    key: storage_key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        tracing::debug!(
            bucket = %self.location.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object written"
        );
        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = Self::object_path(storage_key)?;
        let read_err = |e: ObjectStoreError| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => StorageError::Read {
                key: storage_key.to_string(),
                reason: other.to_string(),
            },
        };

        let object = self.store.get(&path).await.map_err(read_err)?;
        let bytes = object.bytes().await.map_err(read_err)?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = Self::object_path(storage_key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(bucket = %self.location.bucket, key = %storage_key, "Object removed");
                Ok(())
            }
            Err(e) => Err(StorageError::Remove {
                key: storage_key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = Self::object_path(storage_key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.location.object_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(endpoint: Option<&str>) -> S3Location {
        S3Location {
            bucket: "files".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_custom_endpoint_uses_path_style() {
        assert_eq!(
            location(Some("http://localhost:9000/")).object_url("u/1_a.pdf"),
            "http://localhost:9000/files/u/1_a.pdf"
        );
    }

    #[test]
    fn test_aws_uses_virtual_hosted_style() {
        assert_eq!(
            location(None).object_url("u/1_a.pdf"),
            "https://files.s3.eu-west-1.amazonaws.com/u/1_a.pdf"
        );
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_network() {
        let storage = S3Storage::new(location(Some("http://127.0.0.1:1")))
            .await
            .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
        assert!(matches!(
            storage.delete("../other-user/1_a.pdf").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
