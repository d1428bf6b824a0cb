//! # Station Queue Read Models
//!
//! Live queue state per station. `sla_remaining` is computed at query time
//! against the database clock rather than by a background timer, so breach
//! detection is eventually consistent with the caller's polling interval.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state_machine::StationType;

/// One order currently resident at a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StationQueueEntry {
    pub order_id: i64,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub current_state: String,
    pub station: String,
    pub entered_at: NaiveDateTime,
    pub sla_target_minutes: i32,
    pub elapsed_minutes: i64,
    pub sla_remaining_minutes: i64,
    pub breached: bool,
}

/// Aggregate queue health for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StationSummary {
    pub station: String,
    pub open_count: i64,
    pub breach_count: i64,
    pub avg_wait_minutes: Option<f64>,
}

/// Orders currently at a station, paginated, oldest residency first.
/// `sla_remaining_minutes` goes negative once the target is exceeded.
pub async fn orders_by_station(
    pool: &PgPool,
    tenant_id: Uuid,
    station: StationType,
    page: i64,
    per_page: i64,
) -> Result<Vec<StationQueueEntry>, sqlx::Error> {
    let offset = (page.max(1) - 1) * per_page;
    sqlx::query_as::<_, StationQueueEntry>(
        r#"
        SELECT o.order_id, o.order_number, o.tracking_number, o.current_state,
               m.station, m.entered_at, m.sla_target_minutes,
               FLOOR(EXTRACT(EPOCH FROM (NOW() - m.entered_at)) / 60)::BIGINT AS elapsed_minutes,
               (m.sla_target_minutes
                   - FLOOR(EXTRACT(EPOCH FROM (NOW() - m.entered_at)) / 60))::BIGINT
                   AS sla_remaining_minutes,
               ((EXTRACT(EPOCH FROM (NOW() - m.entered_at)) / 60.0) > m.sla_target_minutes)
                   AS breached
        FROM fulfillment_order_station_metrics m
        JOIN fulfillment_orders o
          ON o.order_id = m.order_id AND o.tenant_id = m.tenant_id
        WHERE m.tenant_id = $1 AND m.station = $2 AND m.exited_at IS NULL
        ORDER BY m.entered_at ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(tenant_id)
    .bind(station.to_string())
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Per-station open counts, live breach counts, and average wait
pub async fn station_summary(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<StationSummary>, sqlx::Error> {
    sqlx::query_as::<_, StationSummary>(
        r#"
        SELECT station,
               COUNT(*) AS open_count,
               COUNT(*) FILTER (
                   WHERE (EXTRACT(EPOCH FROM (NOW() - entered_at)) / 60.0) > sla_target_minutes
               ) AS breach_count,
               AVG(EXTRACT(EPOCH FROM (NOW() - entered_at)) / 60.0)::FLOAT8 AS avg_wait_minutes
        FROM fulfillment_order_station_metrics
        WHERE tenant_id = $1 AND exited_at IS NULL
        GROUP BY station
        ORDER BY station
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Pure remaining-time rule shared with live queue reads
pub fn sla_remaining_minutes(sla_target_minutes: i32, elapsed_minutes: i64) -> i64 {
    i64::from(sla_target_minutes) - elapsed_minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sla_remaining_goes_negative_after_breach() {
        assert_eq!(sla_remaining_minutes(60, 45), 15);
        assert_eq!(sla_remaining_minutes(60, 60), 0);
        assert_eq!(sla_remaining_minutes(60, 75), -15);
    }
}
