//! # Order Station Metrics Model
//!
//! One open-or-closed residency interval per (order, station) visit.
//!
//! ## Invariant
//!
//! At most one row per order has `exited_at = NULL` at any time — an order
//! occupies exactly one station, or none. The router enforces this by always
//! closing open rows before opening a new one inside a single transaction,
//! and the schema backs it with a partial unique index:
//!
//! ```sql
//! CREATE UNIQUE INDEX fulfillment_order_station_metrics_single_open
//! ON fulfillment_order_station_metrics (order_id)
//! WHERE exited_at IS NULL;
//! ```
//!
//! Closing computes `duration_minutes` and sets `breached` when the duration
//! strictly exceeds the SLA target; a duration exactly equal to the target
//! is not a breach.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::state_machine::StationType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderStationMetrics {
    pub metric_id: i64,
    pub tenant_id: Uuid,
    pub order_id: i64,
    pub station: String,
    pub entered_at: NaiveDateTime,
    pub exited_at: Option<NaiveDateTime>,
    pub duration_minutes: Option<i32>,
    pub sla_target_minutes: i32,
    pub breached: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl OrderStationMetrics {
    /// The currently-open interval for an order, if any
    pub async fn find_open_for_order(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Option<OrderStationMetrics>, sqlx::Error> {
        sqlx::query_as::<_, OrderStationMetrics>(
            r#"
            SELECT * FROM fulfillment_order_station_metrics
            WHERE tenant_id = $1 AND order_id = $2 AND exited_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether the order already has an open interval at this station
    pub async fn has_open_at_station(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        station: StationType,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM fulfillment_order_station_metrics
                WHERE tenant_id = $1 AND order_id = $2 AND station = $3 AND exited_at IS NULL
            )
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(station.to_string())
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Close every open interval for an order inside the caller's
    /// transaction. Duration and breach flag are computed in SQL against the
    /// same clock that stamps `exited_at`; the breach comparison is strictly
    /// greater-than.
    pub async fn close_all_open(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Vec<OrderStationMetrics>, sqlx::Error> {
        sqlx::query_as::<_, OrderStationMetrics>(
            r#"
            UPDATE fulfillment_order_station_metrics
            SET exited_at = NOW(),
                duration_minutes = FLOOR(EXTRACT(EPOCH FROM (NOW() - entered_at)) / 60)::INT,
                breached = (EXTRACT(EPOCH FROM (NOW() - entered_at)) / 60.0) > sla_target_minutes,
                updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2 AND exited_at IS NULL
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await
    }

    /// Open a new interval for an order at a station inside the caller's
    /// transaction. The partial unique index rejects a second open row.
    pub async fn open(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        order_id: i64,
        station: StationType,
        sla_target_minutes: i32,
    ) -> Result<OrderStationMetrics, sqlx::Error> {
        sqlx::query_as::<_, OrderStationMetrics>(
            r#"
            INSERT INTO fulfillment_order_station_metrics
            (tenant_id, order_id, station, entered_at, sla_target_minutes, breached,
             created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), $4, false, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(station.to_string())
        .bind(sla_target_minutes)
        .fetch_one(&mut **tx)
        .await
    }

    /// Residency history for an order, oldest first
    pub async fn list_by_order(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Vec<OrderStationMetrics>, sqlx::Error> {
        sqlx::query_as::<_, OrderStationMetrics>(
            r#"
            SELECT * FROM fulfillment_order_station_metrics
            WHERE tenant_id = $1 AND order_id = $2
            ORDER BY entered_at ASC, metric_id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(pool)
        .await
    }
}

/// Pure breach rule shared by the SQL close path and live queue reads:
/// a residency breaches its SLA only when the elapsed minutes strictly
/// exceed the target.
pub fn is_breached(duration_minutes: i64, sla_target_minutes: i32) -> bool {
    duration_minutes > i64::from(sla_target_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_is_strictly_greater() {
        assert!(!is_breached(59, 60));
        assert!(!is_breached(60, 60));
        assert!(is_breached(61, 60));
    }

    #[test]
    fn test_breach_handles_long_residency() {
        assert!(is_breached(10_000, 2880));
        assert!(!is_breached(2880, 2880));
    }
}
