//! Hosted backend bundle: object store, row store and session verification

use anyhow::Context;
use std::sync::Arc;

use digifolder_core::Config;
use digifolder_db::{FileRepository, OperationJournal, PgFileRepository, PgOperationJournal};
use digifolder_storage::{create_storage, Storage};

use crate::auth::SessionVerifier;

#[derive(Clone)]
pub struct Backend {
    pub storage: Arc<dyn Storage>,
    pub files: Arc<dyn FileRepository>,
    pub journal: Arc<dyn OperationJournal>,
    pub sessions: SessionVerifier,
}

impl Backend {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        journal: Arc<dyn OperationJournal>,
        sessions: SessionVerifier,
    ) -> Self {
        Self {
            storage,
            files,
            journal,
            sessions,
        }
    }

    /// Connect to PostgreSQL (running migrations) and the configured object store.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = digifolder_db::connect(config).await?;
        let storage = create_storage(config)
            .await
            .context("Failed to initialize storage backend")?;

        tracing::info!(
            storage_backend = %storage.backend_type(),
            "Backend connected"
        );

        Ok(Self::new(
            storage,
            Arc::new(PgFileRepository::new(pool.clone())),
            Arc::new(PgOperationJournal::new(pool)),
            SessionVerifier::from_config(config),
        ))
    }
}
