//! Data models shared by every DigiFolder component.

mod file;
mod ocr;
mod operation;
mod scan;

pub use file::*;
pub use ocr::*;
pub use operation::*;
pub use scan::*;
