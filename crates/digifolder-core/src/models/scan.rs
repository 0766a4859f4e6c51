use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::AppError;

/// Classification of OCR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Text,
    Handwriting,
    Table,
    Mixed,
}

impl ContentCategory {
    /// Table plus handwriting is mixed; either signal alone wins over plain text.
    pub fn from_signals(is_handwritten: bool, has_table: bool) -> Self {
        match (is_handwritten, has_table) {
            (true, true) => ContentCategory::Mixed,
            (true, false) => ContentCategory::Handwriting,
            (false, true) => ContentCategory::Table,
            (false, false) => ContentCategory::Text,
        }
    }
}

/// Output format chosen for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Document,
    Text,
    Spreadsheet,
    Other,
}

/// Result of a single scan-to-file run. Discarded once uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub uri: PathBuf,
    pub document_type: DocumentCategory,
    pub text: String,
    pub content_type: ContentCategory,
    pub confidence: f64,
    pub language: String,
}

/// One captured page of a multi-page document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedPage {
    pub uri: PathBuf,
    pub captured_at: DateTime<Utc>,
}

impl ScannedPage {
    pub fn new(uri: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Ordered page list. Order is the page order of the combined document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedPages {
    pages: Vec<ScannedPage>,
}

impl ScannedPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: ScannedPage) {
        self.pages.push(page);
    }

    pub fn remove(&mut self, index: usize) -> Result<ScannedPage, AppError> {
        if index >= self.pages.len() {
            return Err(AppError::InvalidInput(format!(
                "Page {} does not exist ({} pages)",
                index,
                self.pages.len()
            )));
        }
        Ok(self.pages.remove(index))
    }

    /// Moves the page at `from` so that it ends up at position `to`.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<(), AppError> {
        let len = self.pages.len();
        if from >= len || to >= len {
            return Err(AppError::InvalidInput(format!(
                "Cannot move page {} to {} ({} pages)",
                from, to, len
            )));
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn as_slice(&self) -> &[ScannedPage] {
        &self.pages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScannedPage> {
        self.pages.iter()
    }
}

impl From<Vec<ScannedPage>> for ScannedPages {
    fn from(pages: Vec<ScannedPage>) -> Self {
        Self { pages }
    }
}

impl FromIterator<ScannedPage> for ScannedPages {
    fn from_iter<I: IntoIterator<Item = ScannedPage>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}
