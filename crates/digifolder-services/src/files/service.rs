use chrono::Utc;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use digifolder_core::constants::STORAGE_QUOTA_BYTES;
use digifolder_core::models::{
    DocumentCategory, FileRecord, FileType, NewFileRecord, OcrOptions, OperationKind,
    ScannedPages, StorageStats,
};
use digifolder_core::{AppError, SessionContext};
use digifolder_db::{FileRepository, OperationJournal};
use digifolder_ocr::TextRecognizer;
use digifolder_processing::{naive_csv, ConversionError, ConversionService, NonImagePagePolicy};
use digifolder_storage::{generate_storage_key, sanitize_file_name, Storage};

use crate::backend::Backend;

pub struct FileService {
    pub(super) storage: Arc<dyn Storage>,
    pub(super) files: Arc<dyn FileRepository>,
    pub(super) journal: Arc<dyn OperationJournal>,
    ocr: Arc<dyn TextRecognizer>,
    conversion: ConversionService,
    http_client: reqwest::Client,
    quota_bytes: i64,
    page_policy: NonImagePagePolicy,
}

impl FileService {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        journal: Arc<dyn OperationJournal>,
        ocr: Arc<dyn TextRecognizer>,
        conversion: ConversionService,
    ) -> Self {
        Self {
            storage,
            files,
            journal,
            ocr,
            conversion,
            http_client: reqwest::Client::new(),
            quota_bytes: STORAGE_QUOTA_BYTES,
            page_policy: NonImagePagePolicy::default(),
        }
    }

    pub fn from_backend(
        backend: &Backend,
        ocr: Arc<dyn TextRecognizer>,
        conversion: ConversionService,
    ) -> Self {
        Self::new(
            backend.storage.clone(),
            backend.files.clone(),
            backend.journal.clone(),
            ocr,
            conversion,
        )
    }

    pub fn with_quota(mut self, quota_bytes: i64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// How multi-page PDF saves treat `.txt` / `.csv` pages.
    pub fn with_page_policy(mut self, policy: NonImagePagePolicy) -> Self {
        self.page_policy = policy;
        self
    }

    /// Convert a local file according to its declared type, store it and
    /// record its metadata.
    ///
    /// The declared type is trusted: `pdf` wraps an image into a one-page PDF
    /// and uploads anything else unchanged, `txt` and `csv` run OCR on image
    /// sources, and every other type uploads the raw bytes.
    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id, file_type = %file_type))]
    pub async fn upload_file(
        &self,
        session: &SessionContext,
        local_path: &Path,
        file_type: FileType,
        file_name: &str,
    ) -> Result<FileRecord, AppError> {
        session.ensure_active()?;

        if !fs::try_exists(local_path).await.unwrap_or(false) {
            return Err(AppError::NotFound("File does not exist".to_string()));
        }

        let data = self.prepare_content(local_path, file_type).await?;
        self.store(session, data, file_type, file_name).await
    }

    async fn prepare_content(&self, local_path: &Path, file_type: FileType) -> Result<Vec<u8>, AppError> {
        let source_is_text = matches!(
            FileType::from_path(local_path),
            Some(FileType::Txt) | Some(FileType::Csv)
        );

        match file_type {
            FileType::Pdf => {
                let data = fs::read(local_path).await?;
                match self.conversion.image_bytes_to_pdf(data.clone()).await {
                    Ok(pdf) => Ok(pdf),
                    Err(ConversionError::Image(e)) => {
                        tracing::debug!(error = %e, "Source is not an image, uploading as-is");
                        Ok(data)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            FileType::Txt | FileType::Csv if source_is_text => Ok(fs::read(local_path).await?),
            FileType::Txt => {
                let result = self
                    .ocr
                    .extract_text(local_path, &OcrOptions::default())
                    .await?;
                if result.text.trim().is_empty() {
                    return Err(AppError::InvalidInput(
                        "No text could be extracted from the image".to_string(),
                    ));
                }
                Ok(result.text.into_bytes())
            }
            FileType::Csv => {
                let result = self
                    .ocr
                    .extract_text(local_path, &OcrOptions::default())
                    .await?;
                Ok(naive_csv(&result.text).into_bytes())
            }
            _ => Ok(fs::read(local_path).await?),
        }
    }

    /// Upload saga: journal, object write, row insert, journal completion.
    async fn store(
        &self,
        session: &SessionContext,
        data: Vec<u8>,
        file_type: FileType,
        file_name: &str,
    ) -> Result<FileRecord, AppError> {
        let start = std::time::Instant::now();
        let user_id = session.user_id;
        let storage_key = generate_storage_key(user_id, Utc::now().timestamp_millis(), file_name);
        let size = data.len() as i64;

        let operation = self
            .journal
            .begin(
                user_id,
                OperationKind::Upload {
                    storage_key: storage_key.clone(),
                },
            )
            .await?;

        let url = match self
            .storage
            .upload_with_key(&storage_key, data, file_type.mime_type())
            .await
        {
            Ok(url) => url,
            Err(e) => {
                // A failed write may still have landed; replay removes it.
                tracing::error!(error = %e, key = %storage_key, "Object upload failed");
                return Err(e.into());
            }
        };

        let inserted = self
            .files
            .insert(NewFileRecord {
                name: file_name.to_string(),
                file_type,
                size,
                url,
                storage_key: storage_key.clone(),
                user_id,
            })
            .await;

        let record = match inserted {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, key = %storage_key, "Metadata insert failed, removing uploaded object");
                match self.storage.delete(&storage_key).await {
                    Ok(()) => self.complete_quietly(operation.id).await,
                    Err(cleanup) => tracing::warn!(
                        error = %cleanup,
                        key = %storage_key,
                        operation_id = %operation.id,
                        "Compensating delete failed; left pending for replay"
                    ),
                }
                return Err(e);
            }
        };

        self.complete_quietly(operation.id).await;

        tracing::info!(
            file_id = %record.id,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded"
        );
        Ok(record)
    }

    /// A failed completion only means the entry is replayed later, which is a no-op.
    pub(super) async fn complete_quietly(&self, operation_id: uuid::Uuid) {
        if let Err(e) = self.journal.complete(operation_id).await {
            tracing::warn!(error = %e, operation_id = %operation_id, "Failed to complete journal entry");
        }
    }

    /// All files owned by the session user. Callers must not rely on order.
    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn get_files(&self, session: &SessionContext) -> Result<Vec<FileRecord>, AppError> {
        session.ensure_active()?;
        self.files.list_for_user(session.user_id).await
    }

    /// Usage per file type against the storage quota.
    pub async fn get_storage_stats(&self, session: &SessionContext) -> Result<StorageStats, AppError> {
        let files = self.get_files(session).await?;
        Ok(StorageStats::from_records(&files, self.quota_bytes))
    }

    /// Fetch a public URL into the local cache as `file_name`.
    #[tracing::instrument(skip(self), fields(file_name = %file_name))]
    pub async fn download_file(&self, url: &str, file_name: &str) -> Result<PathBuf, AppError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Remote(format!(
                "Download failed with status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Remote(format!("Download failed: {}", e)))?;
        self.write_cached(file_name, &bytes).await
    }

    /// Fetch an owned file's bytes through the object store into the local cache.
    pub async fn download_record(
        &self,
        session: &SessionContext,
        record: &FileRecord,
    ) -> Result<PathBuf, AppError> {
        session.ensure_active()?;
        if record.user_id != session.user_id {
            return Err(AppError::NotFound(format!("File {} not found", record.id)));
        }

        let data = self.storage.download(&record.storage_key).await?;
        self.write_cached(&record.name, &data).await
    }

    async fn write_cached(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, AppError> {
        let dir = self.conversion.output_dir();
        fs::create_dir_all(dir).await?;
        let path = dir.join(sanitize_file_name(file_name));
        fs::write(&path, data).await?;

        tracing::debug!(path = %path.display(), size_bytes = data.len(), "File cached locally");
        Ok(path)
    }

    /// Save scanned pages as one file: a combined PDF for documents, or the
    /// OCR text of every page for text.
    #[tracing::instrument(skip(self, session, pages), fields(user_id = %session.user_id, pages = pages.len(), document_type = ?document_type))]
    pub async fn save_multi_page_document(
        &self,
        session: &SessionContext,
        pages: &ScannedPages,
        document_type: DocumentCategory,
        file_name: &str,
    ) -> Result<FileRecord, AppError> {
        session.ensure_active()?;
        let paths: Vec<PathBuf> = pages.iter().map(|p| p.uri.clone()).collect();

        match document_type {
            DocumentCategory::Document => {
                let pdf = self
                    .conversion
                    .images_to_pdf(&paths, self.page_policy)
                    .await?;
                let data = fs::read(&pdf).await?;
                self.store(session, data, FileType::Pdf, &format!("{}.pdf", file_name))
                    .await
            }
            DocumentCategory::Text => {
                let text = self.extract_text_from_pages(&paths).await?;
                let text_file = self.save_text_to_file(&text).await?;
                self.upload_file(session, &text_file, FileType::Txt, &format!("{}.txt", file_name))
                    .await
            }
            _ => Err(AppError::InvalidInput("Unsupported document type".to_string())),
        }
    }

    /// OCR every page concurrently; any failure fails the batch.
    pub async fn extract_text_from_pages(&self, pages: &[PathBuf]) -> Result<String, AppError> {
        let options = OcrOptions::default();
        let results = try_join_all(pages.iter().map(|page| self.ocr.extract_text(page, &options))).await?;

        Ok(results
            .into_iter()
            .map(|result| result.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    pub async fn save_text_to_file(&self, content: &str) -> Result<PathBuf, AppError> {
        Ok(self.conversion.write_text("combined_", "txt", content).await?)
    }
}
