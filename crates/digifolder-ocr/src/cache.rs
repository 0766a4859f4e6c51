//! Content-addressed OCR result cache
//!
//! Entries live under `<cache_dir>/ocr/<sha256>.json`. The key covers the
//! image bytes and every option that changes the result, so a renamed or
//! re-captured file with identical content is still a hit while a different
//! language is not. Entries older than the TTL are treated as misses and
//! removed. Writes go to a unique temp file that is renamed into place, so
//! readers never observe a torn entry; concurrent writers of the same key
//! resolve to last-writer-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

use digifolder_core::models::{OcrOptions, OcrResult};

use crate::error::{OcrClientResult, OcrError};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    result: OcrResult,
}

#[derive(Debug, Clone)]
pub struct OcrCache {
    dir: PathBuf,
    ttl: Duration,
}

impl OcrCache {
    pub fn new(cache_root: impl AsRef<Path>, ttl: Duration) -> Self {
        Self {
            dir: cache_root.as_ref().join("ocr"),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex SHA-256 over the image bytes and result-affecting options.
    pub fn key(image: &[u8], options: &OcrOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image);
        hasher.update([0u8]);
        hasher.update(options.language.as_bytes());
        hasher.update([
            0u8,
            options.detect_tables as u8,
            options.detect_handwriting as u8,
        ]);
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Cached result for `key`, if present and fresh.
    pub async fn get(&self, key: &str) -> Option<OcrResult> {
        let path = self.entry_path(key);
        let raw = fs::read(&path).await.ok()?;

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable OCR cache entry");
                let _ = fs::remove_file(&path).await;
                return None;
            }
        };

        let age = Utc::now()
            .signed_duration_since(entry.stored_at)
            .to_std()
            .unwrap_or_default();
        if age >= self.ttl {
            tracing::debug!(key = %key, age_secs = age.as_secs(), "OCR cache entry expired");
            let _ = fs::remove_file(&path).await;
            return None;
        }

        tracing::debug!(key = %key, "OCR cache hit");
        Some(entry.result)
    }

    /// Store `result` under `key` atomically.
    pub async fn put(&self, key: &str, result: &OcrResult) -> OcrClientResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| OcrError::Cache(format!("create {}: {}", self.dir.display(), e)))?;

        let entry = CacheEntry {
            stored_at: Utc::now(),
            result: result.clone(),
        };
        let json = serde_json::to_vec(&entry).map_err(|e| OcrError::Cache(e.to_string()))?;

        let path = self.entry_path(key);
        let temp_path = self.dir.join(format!("{}.{}.tmp", key, Uuid::new_v4()));

        fs::write(&temp_path, &json)
            .await
            .map_err(|e| OcrError::Cache(format!("write {}: {}", temp_path.display(), e)))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(OcrError::Cache(format!("rename {}: {}", path.display(), e)));
        }

        Ok(())
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> OcrClientResult<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::info!(dir = %self.dir.display(), "OCR cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OcrError::Cache(format!(
                "remove {}: {}",
                self.dir.display(),
                e
            ))),
        }
    }
}
