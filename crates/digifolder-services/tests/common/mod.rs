//! Shared fixtures for file service tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

use digifolder_core::models::{OcrOptions, OcrResult};
use digifolder_core::{SessionContext, StorageBackend};
use digifolder_db::{MemoryFileRepository, MemoryOperationJournal};
use digifolder_ocr::{OcrClientResult, OcrError, TextRecognizer};
use digifolder_processing::ConversionService;
use digifolder_services::FileService;
use digifolder_storage::{LocalStorage, Storage, StorageError, StorageResult};

/// Recognizer returning fixed text, or `text of <file stem>` when none is set.
#[derive(Default)]
pub struct StubRecognizer {
    pub fixed: Option<String>,
}

#[async_trait]
impl TextRecognizer for StubRecognizer {
    async fn extract_text(&self, image: &Path, _: &OcrOptions) -> OcrClientResult<OcrResult> {
        if !image.exists() {
            return Err(OcrError::ImageNotFound(image.to_path_buf()));
        }
        let text = match &self.fixed {
            Some(text) => text.clone(),
            None => format!(
                "text of {}",
                image.file_stem().unwrap_or_default().to_string_lossy()
            ),
        };
        Ok(OcrResult {
            text,
            confidence: 0.95,
            is_handwritten: Some(false),
            has_table: Some(false),
            language: "en".to_string(),
        })
    }
}

/// Local storage whose deletes fail for keys containing a configured marker.
pub struct FlakyStorage {
    inner: LocalStorage,
    fail_deletes_containing: Mutex<Option<String>>,
}

impl FlakyStorage {
    pub fn fail_deletes_containing(&self, marker: Option<&str>) {
        *self.fail_deletes_containing.lock().unwrap() = marker.map(str::to_string);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.inner
            .upload_with_key(storage_key, data, content_type)
            .await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let marker = self.fail_deletes_containing.lock().unwrap().clone();
        if let Some(marker) = marker {
            if storage_key.contains(&marker) {
                return Err(StorageError::Remove {
                    key: storage_key.to_string(),
                    reason: "simulated outage".to_string(),
                });
            }
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub storage: Arc<FlakyStorage>,
    pub files: MemoryFileRepository,
    pub journal: MemoryOperationJournal,
    pub service: FileService,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_recognizer(StubRecognizer::default()).await
    }

    pub async fn with_recognizer(recognizer: StubRecognizer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let inner = LocalStorage::new(dir.path().join("store"), "http://localhost/files".to_string())
            .await
            .unwrap();
        let storage = Arc::new(FlakyStorage {
            inner,
            fail_deletes_containing: Mutex::new(None),
        });
        let files = MemoryFileRepository::new();
        let journal = MemoryOperationJournal::new();

        let service = FileService::new(
            storage.clone(),
            Arc::new(files.clone()),
            Arc::new(journal.clone()),
            Arc::new(recognizer),
            ConversionService::new(dir.path().join("cache")),
        );

        Self {
            dir,
            storage,
            files,
            journal,
            service,
        }
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    pub fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.write(name, &png(width, height))
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 60, 90]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn session() -> SessionContext {
    SessionContext::new(
        Uuid::new_v4(),
        Some("owner@example.com".to_string()),
        Utc::now() + Duration::hours(1),
    )
}

pub fn expired_session() -> SessionContext {
    SessionContext::new(Uuid::new_v4(), None, Utc::now() - Duration::minutes(1))
}
