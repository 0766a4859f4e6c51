use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_OCR_LANGUAGE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOptions {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub detect_tables: bool,
    #[serde(default = "default_true")]
    pub detect_handwriting: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

fn default_language() -> String {
    DEFAULT_OCR_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: default_language(),
            detect_tables: true,
            detect_handwriting: true,
            use_cache: true,
        }
    }
}

/// Text recognized in one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_handwritten: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_table: Option<bool>,
    pub language: String,
}

impl OcrResult {
    pub fn is_handwritten(&self) -> bool {
        self.is_handwritten.unwrap_or(false)
    }

    pub fn has_table(&self) -> bool {
        self.has_table.unwrap_or(false)
    }
}
