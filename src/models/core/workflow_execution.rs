//! # Workflow Execution Model
//!
//! The idempotency ledger. Existence of a row for a key is the sole gate
//! against reprocessing.
//!
//! ## Correctness mechanism
//!
//! The unique constraint on `idempotency_key` is the actual synchronization
//! primitive; the pre-check read is purely an optimization to avoid
//! unnecessary work. Two concurrent attempts with the same key race to
//! insert and the loser observes a zero-row `ON CONFLICT DO NOTHING`
//! result, which callers treat identically to "already done". The ledger
//! row is written as the FINAL step of a successful workflow, never the
//! first, so a crash mid-workflow leaves the operation safely retryable.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowExecution {
    pub execution_id: i64,
    pub idempotency_key: String,
    pub workflow_name: String,
    pub outcome: String,
    pub created_at: NaiveDateTime,
}

impl WorkflowExecution {
    /// Pre-check: has this key already been recorded?
    pub async fn exists(pool: &PgPool, idempotency_key: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM fulfillment_workflow_executions WHERE idempotency_key = $1
            )
            "#,
        )
        .bind(idempotency_key)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Record completion of a workflow. Returns `true` when this call
    /// inserted the row, `false` when a concurrent attempt won the race.
    pub async fn record(
        pool: &PgPool,
        idempotency_key: &str,
        workflow_name: &str,
        outcome: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO fulfillment_workflow_executions
            (idempotency_key, workflow_name, outcome, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(idempotency_key)
        .bind(workflow_name)
        .bind(outcome)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_key(
        pool: &PgPool,
        idempotency_key: &str,
    ) -> Result<Option<WorkflowExecution>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowExecution>(
            "SELECT * FROM fulfillment_workflow_executions WHERE idempotency_key = $1",
        )
        .bind(idempotency_key)
        .fetch_optional(pool)
        .await
    }
}
