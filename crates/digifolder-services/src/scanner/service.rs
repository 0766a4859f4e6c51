//! Scan workflow
//!
//! One attempt moves through `Idle -> Captured -> Analyzed -> Converted -> Done`.
//! Any failure ends the attempt with an error; nothing is retried.

use chrono::Utc;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use digifolder_core::constants::SHORT_TEXT_THRESHOLD;
use digifolder_core::models::{
    ContentCategory, DocumentCategory, OcrOptions, ScanResult, ScannedPage, ScannedPages,
};
use digifolder_core::AppError;
use digifolder_ocr::TextRecognizer;
use digifolder_processing::{ConversionOptions, ConversionService, NonImagePagePolicy};

use super::camera::{Camera, CapturedImage, PermissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Idle,
    Captured,
    Analyzed,
    Converted,
    Done,
}

impl Display for ScanStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ScanStage::Idle => "idle",
            ScanStage::Captured => "captured",
            ScanStage::Analyzed => "analyzed",
            ScanStage::Converted => "converted",
            ScanStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Analysis {
    text: String,
    content_type: ContentCategory,
    confidence: f64,
    language: String,
    text_path: PathBuf,
}

#[derive(Clone)]
pub struct ScannerService {
    camera: Arc<dyn Camera>,
    ocr: Arc<dyn TextRecognizer>,
    conversion: ConversionService,
}

impl ScannerService {
    pub fn new(
        camera: Arc<dyn Camera>,
        ocr: Arc<dyn TextRecognizer>,
        conversion: ConversionService,
    ) -> Self {
        Self {
            camera,
            ocr,
            conversion,
        }
    }

    /// Capture, analyze and convert one document.
    #[tracing::instrument(skip(self, options), fields(language = %options.language))]
    pub async fn scan_document(&self, options: &OcrOptions) -> Result<ScanResult, AppError> {
        let mut stage = ScanStage::Idle;

        let captured = self.capture().await.inspect_err(|e| {
            tracing::warn!(stage = %stage, error = %e, "Scan failed");
        })?;
        stage = advance(stage, ScanStage::Captured);

        let analysis = self
            .analyze(&captured.path, options)
            .await
            .inspect_err(|e| tracing::warn!(stage = %stage, error = %e, "Scan failed"))?;
        stage = advance(stage, ScanStage::Analyzed);

        let document_type = Self::detect_document_type(&analysis.text, analysis.content_type);
        let uri = self
            .convert_to_format(&analysis.text_path, document_type, &analysis.text)
            .await
            .inspect_err(|e| tracing::warn!(stage = %stage, error = %e, "Scan failed"))?;
        stage = advance(stage, ScanStage::Converted);

        advance(stage, ScanStage::Done);
        tracing::info!(
            document_type = ?document_type,
            content_type = ?analysis.content_type,
            confidence = analysis.confidence,
            uri = %uri.display(),
            "Scan completed"
        );

        Ok(ScanResult {
            uri,
            document_type,
            text: analysis.text,
            content_type: analysis.content_type,
            confidence: analysis.confidence,
            language: analysis.language,
        })
    }

    /// Capture one more page and append it to `pages`.
    pub async fn capture_page(&self, pages: &mut ScannedPages) -> Result<(), AppError> {
        let captured = self.capture().await?;
        pages.push(ScannedPage::new(captured.path));
        tracing::debug!(pages = pages.len(), "Page added");
        Ok(())
    }

    /// Combine captured pages, in order, into one PDF.
    pub async fn combine_pages(
        &self,
        pages: &ScannedPages,
        policy: NonImagePagePolicy,
    ) -> Result<PathBuf, AppError> {
        let paths: Vec<PathBuf> = pages.iter().map(|p| p.uri.clone()).collect();
        Ok(self.conversion.images_to_pdf(&paths, policy).await?)
    }

    async fn capture(&self) -> Result<CapturedImage, AppError> {
        if self.camera.request_permission().await != PermissionStatus::Granted {
            return Err(AppError::PermissionDenied(
                "Camera permission is required".to_string(),
            ));
        }

        self.camera
            .capture()
            .await?
            .ok_or_else(|| AppError::Cancelled("Scanning cancelled".to_string()))
    }

    async fn analyze(&self, image: &Path, options: &OcrOptions) -> Result<Analysis, AppError> {
        let prepared = self.conversion.prepare_for_ocr(image, "scan_").await?;
        let result = self.ocr.extract_text(&prepared, options).await?;

        let content_type =
            ContentCategory::from_signals(result.is_handwritten(), result.has_table());
        let text_path = self
            .conversion
            .write_text("scan_", "txt", &result.text)
            .await?;

        Ok(Analysis {
            text: result.text,
            content_type,
            confidence: result.confidence,
            language: result.language,
            text_path,
        })
    }

    /// Suggested output format for recognized content.
    pub fn detect_document_type(text: &str, content_type: ContentCategory) -> DocumentCategory {
        match content_type {
            ContentCategory::Table => DocumentCategory::Spreadsheet,
            ContentCategory::Handwriting => DocumentCategory::Document,
            // Length in UTF-16 code units, so characters outside the BMP count twice.
            _ if text.encode_utf16().count() < SHORT_TEXT_THRESHOLD => DocumentCategory::Text,
            _ => DocumentCategory::Document,
        }
    }

    /// Write `text` in the format for `document_type`. `Other` keeps `uri`.
    pub async fn convert_to_format(
        &self,
        uri: &Path,
        document_type: DocumentCategory,
        text: &str,
    ) -> Result<PathBuf, AppError> {
        let converted = match document_type {
            DocumentCategory::Document => {
                let options = ConversionOptions {
                    title: format!("Scanned Document {}", Utc::now().format("%Y-%m-%d")),
                    ..ConversionOptions::default()
                };
                self.conversion.text_to_pdf(text, &options).await?
            }
            DocumentCategory::Text => {
                self.conversion
                    .write_text("extracted_text_", "txt", text)
                    .await?
            }
            DocumentCategory::Spreadsheet => self.conversion.text_to_csv(text).await?,
            DocumentCategory::Other => uri.to_path_buf(),
        };
        Ok(converted)
    }
}

fn advance(from: ScanStage, to: ScanStage) -> ScanStage {
    tracing::debug!(from = %from, to = %to, "Scan stage transition");
    to
}
