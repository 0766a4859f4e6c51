use uuid::Uuid;

use digifolder_core::models::{FileRecord, OperationKind, PendingOperation};
use digifolder_core::{AppError, SessionContext};

use super::service::FileService;

impl FileService {
    /// Delete the session user's files among `ids` and return the refreshed
    /// listing. Ids the user does not own are ignored.
    ///
    /// Objects go first, then rows. The first object that fails to delete
    /// aborts the call with every row still in place; objects already removed
    /// stay removed and the journal entry stays pending so
    /// [`resume_pending`](Self::resume_pending) can finish the job.
    #[tracing::instrument(skip(self, session, ids), fields(user_id = %session.user_id, requested = ids.len()))]
    pub async fn delete_files(
        &self,
        session: &SessionContext,
        ids: &[Uuid],
    ) -> Result<Vec<FileRecord>, AppError> {
        session.ensure_active()?;
        let user_id = session.user_id;

        let owned = self.files.find_owned(user_id, ids).await?;
        if owned.is_empty() {
            tracing::debug!("No owned files matched");
            return self.get_files(session).await;
        }

        let file_ids: Vec<Uuid> = owned.iter().map(|f| f.id).collect();
        let storage_keys: Vec<String> = owned.iter().map(|f| f.storage_key.clone()).collect();

        let operation = self
            .journal
            .begin(
                user_id,
                OperationKind::Delete {
                    file_ids: file_ids.clone(),
                    storage_keys: storage_keys.clone(),
                },
            )
            .await?;

        self.remove_files(user_id, &file_ids, &storage_keys).await?;
        self.complete_quietly(operation.id).await;

        tracing::info!(deleted = file_ids.len(), "Files deleted");
        self.get_files(session).await
    }

    async fn remove_files(
        &self,
        user_id: Uuid,
        file_ids: &[Uuid],
        storage_keys: &[String],
    ) -> Result<(), AppError> {
        self.storage.delete_all(storage_keys).await?;
        self.files.delete_owned(user_id, file_ids).await?;
        Ok(())
    }

    /// Replay the session user's unfinished uploads and deletions, oldest
    /// first. Returns how many entries were completed.
    ///
    /// An unfinished upload whose object no row references has its object
    /// removed; an unfinished deletion is carried through. Replaying an entry
    /// twice has the same effect as once. Run this while no upload of the
    /// same user is in flight.
    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub async fn resume_pending(&self, session: &SessionContext) -> Result<usize, AppError> {
        session.ensure_active()?;

        let pending = self.journal.pending_for_user(session.user_id).await?;
        let mut replayed = 0;
        for operation in pending {
            self.replay(&operation).await?;
            self.journal.complete(operation.id).await?;
            replayed += 1;
        }

        if replayed > 0 {
            tracing::info!(replayed = replayed, "Pending file operations replayed");
        }
        Ok(replayed)
    }

    async fn replay(&self, operation: &PendingOperation) -> Result<(), AppError> {
        tracing::debug!(operation_id = %operation.id, kind = operation.kind.name(), "Replaying operation");

        match &operation.kind {
            OperationKind::Upload { storage_key } => {
                let referenced = self
                    .files
                    .exists_with_key(operation.user_id, storage_key)
                    .await?;
                if !referenced {
                    self.storage.delete(storage_key).await?;
                }
                Ok(())
            }
            OperationKind::Delete {
                file_ids,
                storage_keys,
            } => {
                self.remove_files(operation.user_id, file_ids, storage_keys)
                    .await
            }
        }
    }
}
