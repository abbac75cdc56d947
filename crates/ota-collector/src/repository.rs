//! Storage contract consumed by the collector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use ota_core::{CollectionRun, ContextItem, RunStatus};

/// Opaque failure from a storage backend.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RepositoryError(Box<dyn std::error::Error + Send + Sync>);

impl RepositoryError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Durable store for runs and their items.
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Persists a new run in `running` state.
    async fn create_run(&self, run: &CollectionRun) -> Result<(), RepositoryError>;

    /// Moves a run to a terminal `status` and returns the completion time the
    /// store recorded.
    async fn complete_run(
        &self,
        id: Uuid,
        status: RunStatus,
        error_message: Option<&str>,
        raw_response: Option<&str>,
    ) -> Result<DateTime<Utc>, RepositoryError>;

    /// Saves all items of a run as one batch; either all land or none do.
    async fn save_context_items(&self, items: &[ContextItem]) -> Result<(), RepositoryError>;
}
