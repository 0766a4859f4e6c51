//! Minimal PDF generation
//!
//! Text pages use the built-in Helvetica font; image pages embed JPEG data
//! directly (DCTDecode), so no font or image re-compression happens here.

pub mod font;
pub mod layout;
pub mod writer;

pub use layout::{PlacedLine, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
pub use writer::{DocumentInfo, PdfWriter};
