//! # Shipment Model
//!
//! Per-order shipment timing record. The event processor stamps the pickup,
//! delivery, and return timestamps as the matching internal states are
//! reached; the courier performance engine reads these rows over its
//! trailing window.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Shipment {
    pub shipment_id: i64,
    pub tenant_id: Uuid,
    pub order_id: i64,
    pub courier_code: String,
    pub region: Option<String>,
    pub picked_up_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
    pub returned_at: Option<NaiveDateTime>,
    pub cod_amount: Option<Decimal>,
    pub cod_collected_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipment {
    pub tenant_id: Uuid,
    pub order_id: i64,
    pub courier_code: String,
    pub region: Option<String>,
    pub cod_amount: Option<Decimal>,
}

impl Shipment {
    pub async fn create(pool: &PgPool, new_shipment: NewShipment) -> Result<Shipment, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            r#"
            INSERT INTO fulfillment_shipments
            (tenant_id, order_id, courier_code, region, cod_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new_shipment.tenant_id)
        .bind(new_shipment.order_id)
        .bind(new_shipment.courier_code)
        .bind(new_shipment.region)
        .bind(new_shipment.cod_amount)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_order(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Option<Shipment>, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            "SELECT * FROM fulfillment_shipments WHERE tenant_id = $1 AND order_id = $2",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    /// Stamp the pickup time if not already set. The guard keeps repeated
    /// carrier scans from moving an already-recorded timestamp.
    pub async fn mark_picked_up(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        at: NaiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_shipments
            SET picked_up_at = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2 AND picked_up_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_delivered(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        at: NaiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_shipments
            SET delivered_at = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2 AND delivered_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_returned(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        at: NaiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_shipments
            SET returned_at = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_cod_collected(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        at: NaiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_shipments
            SET cod_collected_at = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2 AND cod_collected_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// All shipments created at or after the cutoff, for performance rollups
    pub async fn list_created_since(
        pool: &PgPool,
        tenant_id: Uuid,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Shipment>, sqlx::Error> {
        sqlx::query_as::<_, Shipment>(
            r#"
            SELECT * FROM fulfillment_shipments
            WHERE tenant_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }
}
