//! Configuration module
//!
//! Configuration is read from the process environment (and an optional `.env`
//! file) once at startup. It covers the row store, object store, OCR endpoint,
//! auth secret and the local cache directory.

use std::env;
use std::path::PathBuf;

use crate::constants::{OCR_CACHE_TTL_SECS, STORAGE_QUOTA_BYTES};
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_TIMEOUT_SECS: u64 = 60;
const VISION_API_URL: &str = "https://vision.googleapis.com";

/// Settings shared by every component
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    pub cache_dir: PathBuf,
}

/// DigiFolder back-end configuration
#[derive(Clone, Debug)]
pub struct DigiFolderConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Shared secret of the hosted auth service (HS256)
    pub auth_jwt_secret: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_quota_bytes: i64,
    // OCR configuration
    pub google_cloud_api_key: Option<String>,
    pub vision_api_url: String,
    pub ocr_cache_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<DigiFolderConfig>);

impl Config {
    fn inner(&self) -> &DigiFolderConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = DigiFolderConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn http_timeout_seconds(&self) -> u64 {
        self.inner().base.http_timeout_seconds
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.inner().base.cache_dir
    }

    pub fn auth_jwt_secret(&self) -> &str {
        &self.inner().auth_jwt_secret
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn storage_quota_bytes(&self) -> i64 {
        self.inner().storage_quota_bytes
    }

    pub fn google_cloud_api_key(&self) -> Option<&str> {
        self.inner().google_cloud_api_key.as_deref()
    }

    pub fn vision_api_url(&self) -> &str {
        &self.inner().vision_api_url
    }

    pub fn ocr_cache_ttl_secs(&self) -> u64 {
        self.inner().ocr_cache_ttl_secs
    }
}

impl DigiFolderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cache_dir = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("digifolder"));

        let base = BaseConfig {
            environment,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HTTP_TIMEOUT_SECS),
            cache_dir,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => Some(value.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        Ok(DigiFolderConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            auth_jwt_secret: env::var("AUTH_JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("AUTH_JWT_SECRET must be set for session checks"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            storage_quota_bytes: env::var("STORAGE_QUOTA_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(STORAGE_QUOTA_BYTES),
            google_cloud_api_key: env::var("GOOGLE_CLOUD_API_KEY").ok(),
            vision_api_url: env::var("VISION_API_URL")
                .unwrap_or_else(|_| VISION_API_URL.to_string()),
            ocr_cache_ttl_secs: env::var("OCR_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(OCR_CACHE_TTL_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.auth_jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "AUTH_JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.storage_quota_bytes <= 0 {
            return Err(anyhow::anyhow!("STORAGE_QUOTA_BYTES must be positive"));
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
