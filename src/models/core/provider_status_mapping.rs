//! # Provider Status Mapping Model
//!
//! Per-tenant rules translating a (carrier, raw status) pair into an
//! internal order state. A carrier code of `*` is the tenant-level wildcard.
//! Tenant rows take precedence over the built-in default table; lookup is
//! carrier-exact then wildcard (see the normalizer).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state_machine::{InternalOrderState, StationType};

/// Wildcard carrier code matching any carrier for a tenant rule
pub const WILDCARD_CARRIER: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProviderStatusMapping {
    pub mapping_id: i64,
    pub tenant_id: Uuid,
    pub carrier_code: String,
    pub provider_status: String,
    pub internal_state: String,
    pub triggers_station: Option<String>,
    pub is_terminal: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProviderStatusMapping {
    pub tenant_id: Uuid,
    pub carrier_code: String,
    pub provider_status: String,
    pub internal_state: InternalOrderState,
    pub triggers_station: Option<StationType>,
    pub is_terminal: bool,
}

impl ProviderStatusMapping {
    /// Insert or replace the rule for (tenant, carrier, provider_status)
    pub async fn upsert(
        pool: &PgPool,
        new_mapping: NewProviderStatusMapping,
    ) -> Result<ProviderStatusMapping, sqlx::Error> {
        sqlx::query_as::<_, ProviderStatusMapping>(
            r#"
            INSERT INTO fulfillment_provider_status_mappings
            (tenant_id, carrier_code, provider_status, internal_state,
             triggers_station, is_terminal, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (tenant_id, carrier_code, provider_status)
            DO UPDATE SET
                internal_state = EXCLUDED.internal_state,
                triggers_station = EXCLUDED.triggers_station,
                is_terminal = EXCLUDED.is_terminal,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(new_mapping.tenant_id)
        .bind(new_mapping.carrier_code)
        .bind(new_mapping.provider_status)
        .bind(new_mapping.internal_state.to_string())
        .bind(new_mapping.triggers_station.map(|s| s.to_string()))
        .bind(new_mapping.is_terminal)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<ProviderStatusMapping>, sqlx::Error> {
        sqlx::query_as::<_, ProviderStatusMapping>(
            r#"
            SELECT * FROM fulfillment_provider_status_mappings
            WHERE tenant_id = $1
            ORDER BY carrier_code ASC, provider_status ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(
        pool: &PgPool,
        tenant_id: Uuid,
        mapping_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM fulfillment_provider_status_mappings WHERE tenant_id = $1 AND mapping_id = $2",
        )
        .bind(tenant_id)
        .bind(mapping_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub fn is_wildcard(&self) -> bool {
        self.carrier_code == WILDCARD_CARRIER
    }
}
