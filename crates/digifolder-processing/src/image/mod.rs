//! Image handling for scanned pages
//!
//! - EXIF orientation normalisation (orientation)
//! - Bounded resize and JPEG re-encoding (preprocess)

pub mod orientation;
pub mod preprocess;

pub use orientation::ImageOrientation;
pub use preprocess::{ImagePreprocessor, PreparedImage};
