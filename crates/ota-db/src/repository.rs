//! Postgres-backed [`CollectionRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ota_collector::{CollectionRepository, RepositoryError};
use ota_core::{CollectionRun, ContextItem, RunStatus};

use crate::{collection_runs, context_items};

#[derive(Debug, Clone)]
pub struct PgCollectionRepository {
    pool: PgPool,
}

impl PgCollectionRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionRepository for PgCollectionRepository {
    async fn create_run(&self, run: &CollectionRun) -> Result<(), RepositoryError> {
        collection_runs::insert_collection_run(&self.pool, run)
            .await
            .map_err(RepositoryError::new)
    }

    async fn complete_run(
        &self,
        id: Uuid,
        status: RunStatus,
        error_message: Option<&str>,
        raw_response: Option<&str>,
    ) -> Result<DateTime<Utc>, RepositoryError> {
        collection_runs::complete_collection_run(&self.pool, id, status, error_message, raw_response)
            .await
            .map_err(RepositoryError::new)
    }

    async fn save_context_items(&self, items: &[ContextItem]) -> Result<(), RepositoryError> {
        context_items::insert_context_items(&self.pool, items)
            .await
            .map(|_| ())
            .map_err(RepositoryError::new)
    }
}
