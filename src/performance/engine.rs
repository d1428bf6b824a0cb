//! # Courier Performance Engine
//!
//! Aggregates shipment timing and outcome data per (courier, region) over a
//! trailing window into daily rollup rows with a 0-100 score and
//! recommendation strings. Guarded by the idempotency ledger keyed on
//! (tenant, date): at most one computation per tenant per day; recomputing
//! after the guard is released upserts rather than duplicates.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::scoring::{compute_score, recommendations, CourierMetrics};
use crate::config::ScoringConfig;
use crate::constants::{events, workflows, WorkflowOutcome};
use crate::events::EventPublisher;
use crate::models::{
    AuditEntry, CourierPerformanceDaily, NewAuditEntry, NewCourierPerformanceDaily, Shipment,
};
use crate::workflows::idempotency::{courier_performance_key, IdempotencyLedger};
use crate::workflows::WorkflowError;

/// Region bucket for shipments without a recorded region
const UNSPECIFIED_REGION: &str = "unspecified";

/// Result of one performance computation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRunOutcome {
    pub couriers_analyzed: usize,
    pub recommendations: Vec<CourierRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierRecommendation {
    pub courier_code: String,
    pub region: String,
    pub score: f64,
    pub recommendations: Vec<String>,
}

pub struct CourierPerformanceEngine {
    pool: PgPool,
    ledger: IdempotencyLedger,
    scoring: ScoringConfig,
    publisher: EventPublisher,
}

impl CourierPerformanceEngine {
    pub fn new(
        pool: PgPool,
        ledger: IdempotencyLedger,
        scoring: ScoringConfig,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            pool,
            ledger,
            scoring,
            publisher,
        }
    }

    /// Compute daily rollups for a tenant. `date` defaults to today.
    ///
    /// The ledger row is written as the final step; a crash mid-run leaves
    /// the computation retryable and the upsert keys make the retry safe.
    pub async fn compute(
        &self,
        tenant_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<PerformanceRunOutcome, WorkflowError> {
        let metric_date = date.unwrap_or_else(|| Utc::now().date_naive());
        let key = courier_performance_key(tenant_id, metric_date);

        if self.ledger.try_begin(&key).await?.already_done {
            tracing::debug!(
                tenant_id = %tenant_id,
                date = %metric_date,
                "Courier performance already computed for this date"
            );
            return Ok(PerformanceRunOutcome {
                couriers_analyzed: 0,
                recommendations: Vec::new(),
            });
        }

        let cutoff =
            metric_date.and_time(chrono::NaiveTime::MIN) - Duration::days(self.scoring.window_days);
        let shipments = Shipment::list_created_since(&self.pool, tenant_id, cutoff).await?;

        let groups = aggregate_shipments(&shipments, self.scoring.on_time_threshold_hours);
        let mut outcome = PerformanceRunOutcome {
            couriers_analyzed: groups.len(),
            recommendations: Vec::new(),
        };

        for ((courier_code, region), metrics) in &groups {
            let score = compute_score(metrics);
            let recs = recommendations(metrics);

            CourierPerformanceDaily::upsert(
                &self.pool,
                NewCourierPerformanceDaily {
                    tenant_id,
                    courier_code: courier_code.clone(),
                    region: region.clone(),
                    metric_date,
                    total_shipments: metrics.total_shipments as i32,
                    delivered_count: metrics.delivered_count as i32,
                    returned_count: metrics.returned_count as i32,
                    avg_pickup_hours: metrics.avg_pickup_hours,
                    avg_delivery_hours: metrics.avg_delivery_hours,
                    avg_return_hours: metrics.avg_return_hours,
                    avg_cod_remittance_hours: metrics.avg_cod_remittance_hours,
                    delivery_rate: metrics.delivery_rate(),
                    return_rate: metrics.return_rate(),
                    on_time_rate: metrics.on_time_rate(),
                    cod_collection_rate: metrics.cod_collection_rate(),
                    score,
                    recommendations: recs.clone(),
                },
            )
            .await?;

            outcome.recommendations.push(CourierRecommendation {
                courier_code: courier_code.clone(),
                region: region.clone(),
                score,
                recommendations: recs,
            });
        }

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "courier_performance".to_string(),
                entity_id: metric_date.to_string(),
                action: "courier_performance.computed".to_string(),
                before_state: None,
                after_state: Some(json!({
                    "couriers_analyzed": outcome.couriers_analyzed,
                    "window_days": self.scoring.window_days,
                })),
                actor: "automation".to_string(),
            },
        )
        .await?;

        // Ledger row last: the guard only engages once the run succeeded
        self.ledger
            .complete(
                &key,
                workflows::COURIER_PERFORMANCE,
                WorkflowOutcome::Succeeded,
            )
            .await?;

        self.publisher
            .publish(
                events::COURIER_PERFORMANCE_COMPUTED,
                json!({
                    "tenant_id": tenant_id,
                    "date": metric_date.to_string(),
                    "couriers_analyzed": outcome.couriers_analyzed,
                }),
            )
            .await
            .ok();

        Ok(outcome)
    }
}

/// Group shipments by (courier, region) and derive per-group metrics.
/// Pure so the aggregation is testable without a database.
pub fn aggregate_shipments(
    shipments: &[Shipment],
    on_time_threshold_hours: f64,
) -> BTreeMap<(String, String), CourierMetrics> {
    struct Accumulator {
        metrics: CourierMetrics,
        pickup_hours: Vec<f64>,
        delivery_hours: Vec<f64>,
        return_hours: Vec<f64>,
        remittance_hours: Vec<f64>,
    }

    let mut groups: BTreeMap<(String, String), Accumulator> = BTreeMap::new();

    for shipment in shipments {
        let region = shipment
            .region
            .clone()
            .unwrap_or_else(|| UNSPECIFIED_REGION.to_string());
        let acc = groups
            .entry((shipment.courier_code.clone(), region))
            .or_insert_with(|| Accumulator {
                metrics: CourierMetrics::default(),
                pickup_hours: Vec::new(),
                delivery_hours: Vec::new(),
                return_hours: Vec::new(),
                remittance_hours: Vec::new(),
            });

        acc.metrics.total_shipments += 1;

        if let Some(picked_up_at) = shipment.picked_up_at {
            acc.pickup_hours
                .push(hours_between(shipment.created_at, picked_up_at));
        }
        if let Some(delivered_at) = shipment.delivered_at {
            acc.metrics.delivered_count += 1;
            let duration = hours_between(shipment.created_at, delivered_at);
            acc.delivery_hours.push(duration);
            if duration <= on_time_threshold_hours {
                acc.metrics.on_time_count += 1;
            }
        }
        if let Some(returned_at) = shipment.returned_at {
            acc.metrics.returned_count += 1;
            acc.return_hours
                .push(hours_between(shipment.created_at, returned_at));
        }
        if shipment.cod_amount.is_some() {
            acc.metrics.cod_shipments += 1;
            if let Some(collected_at) = shipment.cod_collected_at {
                acc.metrics.cod_collected += 1;
                let base = shipment.delivered_at.unwrap_or(shipment.created_at);
                acc.remittance_hours.push(hours_between(base, collected_at));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let mut metrics = acc.metrics;
            metrics.avg_pickup_hours = mean(&acc.pickup_hours).unwrap_or(0.0);
            metrics.avg_delivery_hours = mean(&acc.delivery_hours).unwrap_or(0.0);
            metrics.avg_return_hours = mean(&acc.return_hours);
            metrics.avg_cod_remittance_hours = mean(&acc.remittance_hours);
            (key, metrics)
        })
        .collect()
}

fn hours_between(from: chrono::NaiveDateTime, to: chrono::NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
