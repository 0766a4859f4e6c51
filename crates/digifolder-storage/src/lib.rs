//! Object storage for DigiFolder user files
//!
//! The file service only sees the [`Storage`] trait. Two backends exist, an
//! S3-compatible store (the hosted backend's bucket, AWS, MinIO) and a local
//! directory, chosen by `STORAGE_BACKEND` through [`create_storage`].
//!
//! Keys look like `{user_id}/{timestamp_ms}_{upload_id}_{file_name}` and are built by
//! [`generate_storage_key`]. Every backend refuses keys that fail
//! [`keys::validate_key`].

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use digifolder_core::StorageBackend;
pub use factory::{create_storage, StorageTarget};
pub use keys::{generate_storage_key, sanitize_file_name, validate_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Location, S3Storage};
pub use traits::{Storage, StorageError, StorageResult};
