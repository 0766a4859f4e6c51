//! DigiFolder row store
//!
//! Repository traits for file metadata and the operation journal, their
//! PostgreSQL implementations, and in-memory versions for tests.

pub mod files;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod operations;
pub mod pool;

pub use files::{FileRepository, PgFileRepository};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::{MemoryFileRepository, MemoryOperationJournal};
pub use operations::{OperationJournal, PgOperationJournal};
pub use pool::connect;
