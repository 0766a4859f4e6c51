use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::AppError;

/// Declared file type attached to an upload.
///
/// The declared type is a label chosen by the caller; it is not checked
/// against the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Doc,
    Docx,
    Txt,
    Csv,
    Jpg,
    Jpeg,
    Png,
    Mp4,
    Mov,
    Avi,
}

impl FileType {
    pub const ALL: [FileType; 11] = [
        FileType::Pdf,
        FileType::Doc,
        FileType::Docx,
        FileType::Txt,
        FileType::Csv,
        FileType::Jpg,
        FileType::Jpeg,
        FileType::Png,
        FileType::Mp4,
        FileType::Mov,
        FileType::Avi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
            FileType::Csv => "csv",
            FileType::Jpg => "jpg",
            FileType::Jpeg => "jpeg",
            FileType::Png => "png",
            FileType::Mp4 => "mp4",
            FileType::Mov => "mov",
            FileType::Avi => "avi",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Doc => "application/msword",
            FileType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileType::Txt => "text/plain",
            FileType::Csv => "text/csv",
            FileType::Jpg | FileType::Jpeg => "image/jpeg",
            FileType::Png => "image/png",
            FileType::Mp4 => "video/mp4",
            FileType::Mov => "video/quicktime",
            FileType::Avi => "video/x-msvideo",
        }
    }

    /// Guess the declared type from a path's extension.
    pub fn from_path(path: &Path) -> Option<FileType> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for FileType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().trim_start_matches('.').to_lowercase();
        FileType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| AppError::InvalidInput(format!("Unsupported file type: {}", s)))
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Metadata row describing one stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: i64,
    pub url: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Insert payload for a new file row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub name: String,
    pub file_type: FileType,
    pub size: i64,
    pub url: String,
    pub storage_key: String,
    pub user_id: Uuid,
}

/// Aggregate usage for one user against the storage quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub used: i64,
    pub total: i64,
    pub file_types: BTreeMap<FileType, i64>,
}

impl StorageStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FileRecord>, total: i64) -> Self {
        let mut used = 0;
        let mut file_types = BTreeMap::new();
        for record in records {
            used += record.size;
            *file_types.entry(record.file_type).or_insert(0) += record.size;
        }
        StorageStats {
            used,
            total,
            file_types,
        }
    }

    pub fn available(&self) -> i64 {
        (self.total - self.used).max(0)
    }
}
