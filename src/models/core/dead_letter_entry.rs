//! # Dead Letter Entry Model
//!
//! Failed workflow attempts captured with full context for asynchronous
//! inspection and reprocessing. Entries are resolved by operator action;
//! the engine does not auto-retry in-process.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DeadLetterEntry {
    pub entry_id: i64,
    pub tenant_id: Option<Uuid>,
    pub workflow_name: String,
    pub trigger_payload: serde_json::Value,
    pub error_message: String,
    pub retry_count: i32,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeadLetterEntry {
    pub tenant_id: Option<Uuid>,
    pub workflow_name: String,
    pub trigger_payload: serde_json::Value,
    pub error_message: String,
}

impl DeadLetterEntry {
    pub async fn create(
        pool: &PgPool,
        new_entry: NewDeadLetterEntry,
    ) -> Result<DeadLetterEntry, sqlx::Error> {
        sqlx::query_as::<_, DeadLetterEntry>(
            r#"
            INSERT INTO fulfillment_dead_letter_entries
            (tenant_id, workflow_name, trigger_payload, error_message, retry_count, created_at)
            VALUES ($1, $2, $3, $4, 0, NOW())
            RETURNING *
            "#,
        )
        .bind(new_entry.tenant_id)
        .bind(new_entry.workflow_name)
        .bind(new_entry.trigger_payload)
        .bind(new_entry.error_message)
        .fetch_one(pool)
        .await
    }

    /// Open entries awaiting operator inspection, oldest first
    pub async fn list_open(pool: &PgPool, limit: i64) -> Result<Vec<DeadLetterEntry>, sqlx::Error> {
        sqlx::query_as::<_, DeadLetterEntry>(
            r#"
            SELECT * FROM fulfillment_dead_letter_entries
            WHERE resolved_at IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Operator resolution: stamps `resolved_at`. Returns the updated row,
    /// or None when the entry does not exist or was already resolved.
    pub async fn resolve(
        pool: &PgPool,
        entry_id: i64,
    ) -> Result<Option<DeadLetterEntry>, sqlx::Error> {
        sqlx::query_as::<_, DeadLetterEntry>(
            r#"
            UPDATE fulfillment_dead_letter_entries
            SET resolved_at = NOW()
            WHERE entry_id = $1 AND resolved_at IS NULL
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .fetch_optional(pool)
        .await
    }

    /// Count an operator-driven reprocess attempt against the entry
    pub async fn increment_retry(pool: &PgPool, entry_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_dead_letter_entries
            SET retry_count = retry_count + 1
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
