//! # Audit Entry Model
//!
//! Immutable append-only record of every state-changing action, with
//! before/after values serialized as JSONB. Rows are never updated or
//! deleted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub audit_id: i64,
    pub tenant_id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub actor: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub tenant_id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub actor: String,
}

impl AuditEntry {
    pub async fn create(pool: &PgPool, new_entry: NewAuditEntry) -> Result<AuditEntry, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO fulfillment_audit_entries
            (tenant_id, entity_type, entity_id, action, before_state, after_state, actor, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING *
            "#,
        )
        .bind(new_entry.tenant_id)
        .bind(new_entry.entity_type)
        .bind(new_entry.entity_id)
        .bind(new_entry.action)
        .bind(new_entry.before_state)
        .bind(new_entry.after_state)
        .bind(new_entry.actor)
        .fetch_one(pool)
        .await
    }

    /// Audit trail for one entity, oldest first
    pub async fn list_for_entity(
        pool: &PgPool,
        tenant_id: Uuid,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT * FROM fulfillment_audit_entries
            WHERE tenant_id = $1 AND entity_type = $2 AND entity_id = $3
            ORDER BY audit_id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await
    }
}
