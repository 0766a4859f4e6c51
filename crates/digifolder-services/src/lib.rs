//! DigiFolder service layer
//!
//! Orchestration on top of the storage, row store, OCR and conversion
//! crates: session verification, the scanner workflow and the file service.
//! Every user-scoped operation takes an explicit [`SessionContext`].

pub mod auth;
pub mod backend;
pub mod files;
pub mod scanner;

pub use auth::{AccessClaims, SessionVerifier};
pub use backend::Backend;
pub use digifolder_core::SessionContext;
pub use files::FileService;
pub use scanner::{Camera, CapturedImage, FileCamera, PermissionStatus, ScanStage, ScannerService};
