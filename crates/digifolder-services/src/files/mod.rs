//! File service: uploads, listing, deletion, downloads and usage stats
//!
//! Object store and row store writes are not transactional. Uploads and
//! deletions are journaled sagas: the journal entry is written before the
//! first side effect and completed after the last, and entries left pending
//! by a crash or a failed compensation are replayed by
//! [`FileService::resume_pending`].

mod recovery;
mod service;

pub use service::FileService;
