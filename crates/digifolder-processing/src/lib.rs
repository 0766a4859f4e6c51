//! DigiFolder conversion and image processing
//!
//! Local, network-free transformations: text to PDF or HTML, page images to
//! a combined PDF, image preparation for OCR, and table reconstruction.

pub mod doc;
pub mod error;
pub mod image;
pub mod pdf;
pub mod service;
pub mod table;

pub use error::{ConversionError, ConversionResult};
pub use self::image::{ImageOrientation, ImagePreprocessor, PreparedImage};
pub use service::{ConversionOptions, ConversionService, NonImagePagePolicy};
pub use table::{looks_like_table, naive_csv, reconstruct_csv};
