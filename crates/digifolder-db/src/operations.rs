//! Journal for multi-step file operations
//!
//! An upload writes an object and then a row; a delete removes objects and
//! then rows. Neither pair is transactional, so each operation is recorded
//! here before its first side effect and marked complete after its last one.
//! Entries left pending are replayed by the file service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digifolder_core::models::{OperationKind, PendingOperation};
use digifolder_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait]
pub trait OperationJournal: Send + Sync {
    /// Record a new pending operation.
    async fn begin(&self, user_id: Uuid, kind: OperationKind)
        -> Result<PendingOperation, AppError>;

    /// Mark an operation as finished. Completing twice is a no-op.
    async fn complete(&self, id: Uuid) -> Result<(), AppError>;

    /// Pending operations of one user, oldest first.
    async fn pending_for_user(&self, user_id: Uuid) -> Result<Vec<PendingOperation>, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct OperationRow {
    id: Uuid,
    user_id: Uuid,
    payload: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OperationRow> for PendingOperation {
    type Error = AppError;

    fn try_from(row: OperationRow) -> Result<Self, Self::Error> {
        Ok(PendingOperation {
            id: row.id,
            user_id: row.user_id,
            kind: serde_json::from_str(&row.payload)?,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed operation journal
#[derive(Clone)]
pub struct PgOperationJournal {
    pool: PgPool,
}

impl PgOperationJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperationJournal for PgOperationJournal {
    #[tracing::instrument(skip(self, kind), fields(db.table = "file_operations", db.operation = "insert", kind = kind.name()))]
    async fn begin(
        &self,
        user_id: Uuid,
        kind: OperationKind,
    ) -> Result<PendingOperation, AppError> {
        let payload = serde_json::to_string(&kind)
            .map_err(|e| AppError::Internal(format!("Failed to encode operation: {}", e)))?;

        let row = sqlx::query_as::<Postgres, OperationRow>(
            r#"
            INSERT INTO file_operations (id, user_id, kind, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, payload, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.name())
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_operations", db.operation = "update", db.record_id = %id))]
    async fn complete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE file_operations SET completed_at = NOW() WHERE id = $1 AND completed_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_operations", db.operation = "select"))]
    async fn pending_for_user(&self, user_id: Uuid) -> Result<Vec<PendingOperation>, AppError> {
        let rows = sqlx::query_as::<Postgres, OperationRow>(
            r#"
            SELECT id, user_id, payload, created_at
            FROM file_operations
            WHERE user_id = $1 AND completed_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PendingOperation::try_from).collect()
    }
}
