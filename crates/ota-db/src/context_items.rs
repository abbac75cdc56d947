//! Database operations for `context_items`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ota_core::ContextItem;

use crate::DbError;

/// A row from the `context_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContextItemRow {
    pub id: Uuid,
    pub collection_run_id: Uuid,
    pub category: String,
    pub rank: i64,
    /// Index within the provider's answer after filtering.
    pub position: i32,
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ContextItemRow> for ContextItem {
    fn from(row: ContextItemRow) -> Self {
        ContextItem {
            id: row.id,
            collection_run_id: row.collection_run_id,
            category: row.category,
            rank: row.rank,
            topic: row.topic,
            summary: row.summary,
            sources: row.sources,
        }
    }
}

/// Inserts all items in a single transaction, recording each item's slice
/// index as its `position`.
///
/// Returns the number of rows written. An empty slice is a no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is written in that
/// case.
pub async fn insert_context_items(pool: &PgPool, items: &[ContextItem]) -> Result<u64, DbError> {
    if items.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written = 0_u64;

    for (position, item) in items.iter().enumerate() {
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        let result = sqlx::query(
            "INSERT INTO context_items \
                 (id, collection_run_id, category, rank, position, topic, summary, sources) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(item.id)
        .bind(item.collection_run_id)
        .bind(&item.category)
        .bind(item.rank)
        .bind(position)
        .bind(&item.topic)
        .bind(&item.summary)
        .bind(item.sources.as_slice())
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Returns the items of one run in the order they were saved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_context_items(
    pool: &PgPool,
    run_id: Uuid,
) -> Result<Vec<ContextItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ContextItemRow>(
        "SELECT id, collection_run_id, category, rank, position, topic, summary, sources, \
                created_at \
         FROM context_items \
         WHERE collection_run_id = $1 \
         ORDER BY position",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
