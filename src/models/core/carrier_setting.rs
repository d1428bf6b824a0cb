//! # Carrier Setting Model
//!
//! Per-tenant carrier enable/disable rows consumed by the smart routing
//! scorer. Unique per (tenant, carrier).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CarrierSetting {
    pub setting_id: i64,
    pub tenant_id: Uuid,
    pub carrier_code: String,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CarrierSetting {
    /// Enable or disable a carrier for a tenant
    pub async fn set_enabled(
        pool: &PgPool,
        tenant_id: Uuid,
        carrier_code: &str,
        enabled: bool,
    ) -> Result<CarrierSetting, sqlx::Error> {
        sqlx::query_as::<_, CarrierSetting>(
            r#"
            INSERT INTO fulfillment_carrier_settings
            (tenant_id, carrier_code, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (tenant_id, carrier_code)
            DO UPDATE SET enabled = EXCLUDED.enabled, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(carrier_code)
        .bind(enabled)
        .fetch_one(pool)
        .await
    }

    /// Carriers the administrator has disabled for this tenant
    pub async fn disabled_carriers(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT carrier_code FROM fulfillment_carrier_settings
            WHERE tenant_id = $1 AND enabled = false
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<CarrierSetting>, sqlx::Error> {
        sqlx::query_as::<_, CarrierSetting>(
            "SELECT * FROM fulfillment_carrier_settings WHERE tenant_id = $1 ORDER BY carrier_code",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }
}
