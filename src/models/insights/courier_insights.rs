//! # Courier Performance Read Models
//!
//! Window summaries over the daily rollups backing the "courier performance
//! over N days" query surface.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Aggregated courier view across a trailing window of daily rollups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourierWindowSummary {
    pub courier_code: String,
    pub region: String,
    pub total_shipments: i64,
    pub delivered_count: i64,
    pub returned_count: i64,
    pub avg_score: Option<f64>,
    pub avg_delivery_rate: Option<f64>,
    pub avg_return_rate: Option<f64>,
    pub avg_on_time_rate: Option<f64>,
    pub avg_cod_collection_rate: Option<f64>,
    pub avg_pickup_hours: Option<f64>,
    pub avg_delivery_hours: Option<f64>,
}

/// Per-(courier, region) summary over the last `days` of rollups,
/// optionally filtered by courier and region
pub async fn courier_performance_window(
    pool: &PgPool,
    tenant_id: Uuid,
    days: i64,
    courier_code: Option<&str>,
    region: Option<&str>,
) -> Result<Vec<CourierWindowSummary>, sqlx::Error> {
    sqlx::query_as::<_, CourierWindowSummary>(
        r#"
        SELECT courier_code,
               region,
               SUM(total_shipments)::BIGINT AS total_shipments,
               SUM(delivered_count)::BIGINT AS delivered_count,
               SUM(returned_count)::BIGINT AS returned_count,
               AVG(score)::FLOAT8 AS avg_score,
               AVG(delivery_rate)::FLOAT8 AS avg_delivery_rate,
               AVG(return_rate)::FLOAT8 AS avg_return_rate,
               AVG(on_time_rate)::FLOAT8 AS avg_on_time_rate,
               AVG(cod_collection_rate)::FLOAT8 AS avg_cod_collection_rate,
               AVG(avg_pickup_hours)::FLOAT8 AS avg_pickup_hours,
               AVG(avg_delivery_hours)::FLOAT8 AS avg_delivery_hours
        FROM fulfillment_courier_performance_daily
        WHERE tenant_id = $1
          AND metric_date >= (CURRENT_DATE - ($2 || ' days')::INTERVAL)::DATE
          AND ($3::VARCHAR IS NULL OR courier_code = $3)
          AND ($4::VARCHAR IS NULL OR region = $4)
        GROUP BY courier_code, region
        ORDER BY avg_score DESC NULLS LAST, courier_code ASC
        "#,
    )
    .bind(tenant_id)
    .bind(days.to_string())
    .bind(courier_code)
    .bind(region)
    .fetch_all(pool)
    .await
}
