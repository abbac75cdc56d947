//! Database operations for `collection_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ota_core::{CollectionRun, RunStatus};

use crate::DbError;

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Constrained by the schema to `running`, `success` or `failed`.
    pub status: String,
    pub error_message: Option<String>,
    pub raw_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CollectionRunRow> for CollectionRun {
    type Error = DbError;

    fn try_from(row: CollectionRunRow) -> Result<Self, Self::Error> {
        Ok(CollectionRun {
            id: row.id,
            started_at: row.started_at,
            completed_at: row.completed_at,
            status: row.status.parse::<RunStatus>()?,
            error_message: row.error_message,
            raw_response: row.raw_response,
        })
    }
}

const RUN_COLUMNS: &str =
    "id, started_at, completed_at, status, error_message, raw_response, created_at";

/// Inserts a run exactly as given; the caller owns id and `started_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate id).
pub async fn insert_collection_run(pool: &PgPool, run: &CollectionRun) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO collection_runs \
             (id, started_at, completed_at, status, error_message, raw_response) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(run.id)
    .bind(run.started_at)
    .bind(run.completed_at)
    .bind(run.status.as_str())
    .bind(run.error_message.as_deref())
    .bind(run.raw_response.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// Moves a `running` run to a terminal `status`, sets `completed_at = NOW()`
/// and returns that timestamp.
///
/// `error_message` is only stored for `failed` runs.
///
/// # Errors
///
/// Returns [`DbError::InvalidStatus`] if `status` is `running`,
/// [`DbError::InvalidCollectionRunTransition`] if the run does not exist or is
/// already finalized, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: Uuid,
    status: RunStatus,
    error_message: Option<&str>,
    raw_response: Option<&str>,
) -> Result<DateTime<Utc>, DbError> {
    if !status.is_terminal() {
        return Err(DbError::InvalidStatus(status.to_string()));
    }
    let error_message = error_message.filter(|_| status == RunStatus::Failed);

    let completed_at = sqlx::query_scalar::<_, DateTime<Utc>>(
        "UPDATE collection_runs \
         SET status = $1, completed_at = NOW(), error_message = $2, raw_response = $3 \
         WHERE id = $4 AND status = 'running' \
         RETURNING completed_at",
    )
    .bind(status.as_str())
    .bind(error_message)
    .bind(raw_response)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    completed_at.ok_or(DbError::InvalidCollectionRunTransition { id })
}

/// Fetches a single run by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: Uuid) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         ORDER BY started_at DESC, created_at DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recently started run that reached `success`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_successful_run(pool: &PgPool) -> Result<Option<CollectionRunRow>, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         WHERE status = 'success' \
         ORDER BY started_at DESC \
         LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
