//! Document scanner: capture, OCR analysis and format conversion

pub mod camera;
pub mod service;

pub use camera::{Camera, CapturedImage, FileCamera, PermissionStatus};
pub use service::{ScanStage, ScannerService};
