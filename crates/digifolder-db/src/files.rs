use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digifolder_core::models::{FileRecord, FileType, NewFileRecord};
use digifolder_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Row store operations on file metadata. Every query is scoped to an owner.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, file: NewFileRecord) -> Result<FileRecord, AppError>;

    /// All files owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, AppError>;

    /// Files among `ids` that `user_id` owns. Ids owned by others are ignored.
    async fn find_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<FileRecord>, AppError>;

    /// Deletes the owned rows among `ids` and returns how many were removed.
    async fn delete_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError>;

    async fn exists_with_key(&self, user_id: Uuid, storage_key: &str) -> Result<bool, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: Uuid,
    name: String,
    #[sqlx(rename = "type")]
    file_type: String,
    size: i64,
    url: String,
    storage_key: String,
    created_at: DateTime<Utc>,
    user_id: Uuid,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = AppError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(FileRecord {
            id: row.id,
            name: row.name,
            file_type: row.file_type.parse::<FileType>()?,
            size: row.size,
            url: row.url,
            storage_key: row.storage_key,
            created_at: row.created_at,
            user_id: row.user_id,
        })
    }
}

fn into_records(rows: Vec<FileRow>) -> Result<Vec<FileRecord>, AppError> {
    rows.into_iter().map(FileRecord::try_from).collect()
}

const FILE_COLUMNS: &str = "id, name, type, size, url, storage_key, created_at, user_id";

/// PostgreSQL-backed file repository
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self, file), fields(db.table = "files", db.operation = "insert", user_id = %file.user_id))]
    async fn insert(&self, file: NewFileRecord) -> Result<FileRecord, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            INSERT INTO files (name, type, size, url, storage_key, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(&file.name)
        .bind(file.file_type.as_str())
        .bind(file.size)
        .bind(&file.url)
        .bind(&file.storage_key)
        .bind(file.user_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM files WHERE user_id = $1 ORDER BY created_at DESC",
            FILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "files", db.operation = "select", ids = ids.len()))]
    async fn find_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<FileRecord>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = ANY($1) AND user_id = $2",
            FILE_COLUMNS
        ))
        .bind(ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "files", db.operation = "delete", ids = ids.len()))]
    async fn delete_owned(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM files WHERE id = ANY($1) AND user_id = $2")
            .bind(ids)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn exists_with_key(&self, user_id: Uuid, storage_key: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM files WHERE user_id = $1 AND storage_key = $2)",
        )
        .bind(user_id)
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
