//! DigiFolder OCR client
//!
//! Sends page images to Google Cloud Vision text detection, derives
//! handwriting and table signals from the response, and caches results on
//! disk by content hash.

pub mod cache;
pub mod client;
pub mod error;
pub mod vision;

pub use cache::OcrCache;
pub use client::{OcrClient, TextRecognizer};
pub use error::{OcrClientResult, OcrError};
pub use vision::{VisionClient, DEFAULT_VISION_API_URL};
