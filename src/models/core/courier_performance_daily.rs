//! # Courier Performance Daily Model
//!
//! Daily per-(courier, region) aggregate rollup. Upserted idempotently
//! keyed by (tenant, courier, date, region); recomputing for the same key
//! overwrites rather than duplicates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourierPerformanceDaily {
    pub rollup_id: i64,
    pub tenant_id: Uuid,
    pub courier_code: String,
    pub region: String,
    pub metric_date: NaiveDate,
    pub total_shipments: i32,
    pub delivered_count: i32,
    pub returned_count: i32,
    pub avg_pickup_hours: f64,
    pub avg_delivery_hours: f64,
    pub avg_return_hours: Option<f64>,
    pub avg_cod_remittance_hours: Option<f64>,
    pub delivery_rate: f64,
    pub return_rate: f64,
    pub on_time_rate: f64,
    pub cod_collection_rate: f64,
    pub score: f64,
    pub recommendations: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New rollup row for upsert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourierPerformanceDaily {
    pub tenant_id: Uuid,
    pub courier_code: String,
    pub region: String,
    pub metric_date: NaiveDate,
    pub total_shipments: i32,
    pub delivered_count: i32,
    pub returned_count: i32,
    pub avg_pickup_hours: f64,
    pub avg_delivery_hours: f64,
    pub avg_return_hours: Option<f64>,
    pub avg_cod_remittance_hours: Option<f64>,
    pub delivery_rate: f64,
    pub return_rate: f64,
    pub on_time_rate: f64,
    pub cod_collection_rate: f64,
    pub score: f64,
    pub recommendations: Vec<String>,
}

impl CourierPerformanceDaily {
    /// Upsert the rollup for (tenant, courier, date, region). Safe to
    /// recompute for the same day; the conflict target overwrites in place.
    pub async fn upsert(
        pool: &PgPool,
        row: NewCourierPerformanceDaily,
    ) -> Result<CourierPerformanceDaily, sqlx::Error> {
        sqlx::query_as::<_, CourierPerformanceDaily>(
            r#"
            INSERT INTO fulfillment_courier_performance_daily
            (tenant_id, courier_code, region, metric_date, total_shipments,
             delivered_count, returned_count, avg_pickup_hours, avg_delivery_hours,
             avg_return_hours, avg_cod_remittance_hours, delivery_rate, return_rate,
             on_time_rate, cod_collection_rate, score, recommendations,
             created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    NOW(), NOW())
            ON CONFLICT (tenant_id, courier_code, metric_date, region)
            DO UPDATE SET
                total_shipments = EXCLUDED.total_shipments,
                delivered_count = EXCLUDED.delivered_count,
                returned_count = EXCLUDED.returned_count,
                avg_pickup_hours = EXCLUDED.avg_pickup_hours,
                avg_delivery_hours = EXCLUDED.avg_delivery_hours,
                avg_return_hours = EXCLUDED.avg_return_hours,
                avg_cod_remittance_hours = EXCLUDED.avg_cod_remittance_hours,
                delivery_rate = EXCLUDED.delivery_rate,
                return_rate = EXCLUDED.return_rate,
                on_time_rate = EXCLUDED.on_time_rate,
                cod_collection_rate = EXCLUDED.cod_collection_rate,
                score = EXCLUDED.score,
                recommendations = EXCLUDED.recommendations,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(row.tenant_id)
        .bind(row.courier_code)
        .bind(row.region)
        .bind(row.metric_date)
        .bind(row.total_shipments)
        .bind(row.delivered_count)
        .bind(row.returned_count)
        .bind(row.avg_pickup_hours)
        .bind(row.avg_delivery_hours)
        .bind(row.avg_return_hours)
        .bind(row.avg_cod_remittance_hours)
        .bind(row.delivery_rate)
        .bind(row.return_rate)
        .bind(row.on_time_rate)
        .bind(row.cod_collection_rate)
        .bind(row.score)
        .bind(serde_json::json!(row.recommendations))
        .fetch_one(pool)
        .await
    }

    /// Rollups newer than `since`, optionally filtered by courier and region
    pub async fn list_window(
        pool: &PgPool,
        tenant_id: Uuid,
        since: NaiveDate,
        courier_code: Option<&str>,
        region: Option<&str>,
    ) -> Result<Vec<CourierPerformanceDaily>, sqlx::Error> {
        sqlx::query_as::<_, CourierPerformanceDaily>(
            r#"
            SELECT * FROM fulfillment_courier_performance_daily
            WHERE tenant_id = $1
              AND metric_date >= $2
              AND ($3::VARCHAR IS NULL OR courier_code = $3)
              AND ($4::VARCHAR IS NULL OR region = $4)
            ORDER BY metric_date DESC, courier_code ASC, region ASC
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .bind(courier_code)
        .bind(region)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_key(
        pool: &PgPool,
        tenant_id: Uuid,
        courier_code: &str,
        metric_date: NaiveDate,
        region: &str,
    ) -> Result<Option<CourierPerformanceDaily>, sqlx::Error> {
        sqlx::query_as::<_, CourierPerformanceDaily>(
            r#"
            SELECT * FROM fulfillment_courier_performance_daily
            WHERE tenant_id = $1 AND courier_code = $2 AND metric_date = $3 AND region = $4
            "#,
        )
        .bind(tenant_id)
        .bind(courier_code)
        .bind(metric_date)
        .bind(region)
        .fetch_optional(pool)
        .await
    }
}
