//! Application-wide constants

/// Per-user storage quota reported by storage statistics (1 GiB).
pub const STORAGE_QUOTA_BYTES: i64 = 1024 * 1024 * 1024;

/// OCR confidence below this value marks the page as handwritten.
pub const HANDWRITING_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Extracted text shorter than this (in UTF-16 code units) is kept as plain text.
pub const SHORT_TEXT_THRESHOLD: usize = 1000;

/// Default OCR language hint.
pub const DEFAULT_OCR_LANGUAGE: &str = "en";

/// Default OCR cache entry lifetime (30 days).
pub const OCR_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;
