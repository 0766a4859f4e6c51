//! In-memory repository implementations for testing
//!
//! These let the file service run without a database. They honor the same
//! owner scoping as the PostgreSQL repositories.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use digifolder_core::models::{FileRecord, NewFileRecord, OperationKind, PendingOperation};
use digifolder_core::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::files::FileRepository;
use crate::operations::OperationJournal;

fn poisoned() -> AppError {
    AppError::Internal("in-memory store lock poisoned".to_string())
}

/// In-memory file repository
#[derive(Clone, Default)]
pub struct MemoryFileRepository {
    files: Arc<Mutex<Vec<FileRecord>>>,
    fail_inserts: Arc<AtomicBool>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail until reset.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn add_file(&self, record: FileRecord) {
        if let Ok(mut files) = self.files.lock() {
            files.push(record);
        }
    }

    pub fn all(&self) -> Vec<FileRecord> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn insert(&self, file: NewFileRecord) -> Result<FileRecord, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert rejected".to_string()));
        }

        let mut files = self.files.lock().map_err(|_| poisoned())?;
        // Keep creation times strictly increasing so newest-first ordering is stable.
        let created_at = files
            .iter()
            .map(|f| f.created_at)
            .max()
            .map(|latest| (latest + Duration::microseconds(1)).max(Utc::now()))
            .unwrap_or_else(Utc::now);

        let record = FileRecord {
            id: Uuid::new_v4(),
            name: file.name,
            file_type: file.file_type,
            size: file.size,
            url: file.url,
            storage_key: file.storage_key,
            created_at,
            user_id: file.user_id,
        };
        files.push(record.clone());
        Ok(record)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        let mut owned: Vec<FileRecord> = files
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<FileRecord>, AppError> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        Ok(files
            .iter()
            .filter(|f| f.user_id == user_id && ids.contains(&f.id))
            .cloned()
            .collect())
    }

    async fn delete_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError> {
        let mut files = self.files.lock().map_err(|_| poisoned())?;
        let before = files.len();
        files.retain(|f| !(f.user_id == user_id && ids.contains(&f.id)));
        Ok((before - files.len()) as u64)
    }

    async fn exists_with_key(&self, user_id: Uuid, storage_key: &str) -> Result<bool, AppError> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        Ok(files
            .iter()
            .any(|f| f.user_id == user_id && f.storage_key == storage_key))
    }
}

/// In-memory operation journal
#[derive(Clone, Default)]
pub struct MemoryOperationJournal {
    operations: Arc<Mutex<HashMap<Uuid, (PendingOperation, bool)>>>,
}

impl MemoryOperationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations not yet completed, across all users.
    pub fn pending_count(&self) -> usize {
        self.operations
            .lock()
            .map(|ops| ops.values().filter(|(_, done)| !done).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl OperationJournal for MemoryOperationJournal {
    async fn begin(
        &self,
        user_id: Uuid,
        kind: OperationKind,
    ) -> Result<PendingOperation, AppError> {
        let op = PendingOperation {
            id: Uuid::new_v4(),
            user_id,
            kind,
            created_at: Utc::now(),
        };
        self.operations
            .lock()
            .map_err(|_| poisoned())?
            .insert(op.id, (op.clone(), false));
        Ok(op)
    }

    async fn complete(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(entry) = self.operations.lock().map_err(|_| poisoned())?.get_mut(&id) {
            entry.1 = true;
        }
        Ok(())
    }

    async fn pending_for_user(&self, user_id: Uuid) -> Result<Vec<PendingOperation>, AppError> {
        let ops = self.operations.lock().map_err(|_| poisoned())?;
        let mut pending: Vec<PendingOperation> = ops
            .values()
            .filter(|(op, done)| !done && op.user_id == user_id)
            .map(|(op, _)| op.clone())
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }
}
