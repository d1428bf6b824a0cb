//! # Station Router & SLA Tracker
//!
//! Opens and closes per-station residency intervals for orders. The
//! close-all-then-open sequence runs in a single transaction so the
//! single-open-row invariant holds; the partial unique index on the metrics
//! table backs it at the storage layer.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::SlaConfig;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::log_station_operation;
use crate::models::{AuditEntry, NewAuditEntry, Order, OrderStationMetrics, TenantRoutingProfile};
use crate::state_machine::StationType;

/// Result of one routing call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteOutcome {
    pub routed: bool,
}

pub struct StationRouter {
    pool: PgPool,
    slas: SlaConfig,
    publisher: EventPublisher,
}

impl StationRouter {
    pub fn new(pool: PgPool, slas: SlaConfig, publisher: EventPublisher) -> Self {
        Self {
            pool,
            slas,
            publisher,
        }
    }

    /// Route an order to a station.
    ///
    /// Idempotent re-entry: when the order already has an open interval at
    /// `station` this is a no-op. Otherwise every open interval is closed
    /// (duration computed, breach flagged) and a new one opened with the
    /// SLA target resolved from configuration defaults layered under the
    /// tenant's overrides. The order's denormalized current-station pointer
    /// is updated last.
    pub async fn route(
        &self,
        tenant_id: Uuid,
        order_id: i64,
        station: StationType,
    ) -> Result<RouteOutcome, sqlx::Error> {
        if OrderStationMetrics::has_open_at_station(&self.pool, tenant_id, order_id, station)
            .await?
        {
            log_station_operation("route", Some(order_id), Some(&station.to_string()), "noop", None);
            return Ok(RouteOutcome { routed: false });
        }

        let profile = TenantRoutingProfile::find_by_tenant(&self.pool, tenant_id).await?;
        let sla_target = profile
            .as_ref()
            .and_then(|p| p.sla_override_for(station))
            .unwrap_or_else(|| self.slas.target_for(station));

        let previous_station;
        let closed;
        {
            let mut tx = self.pool.begin().await?;
            closed = OrderStationMetrics::close_all_open(&mut tx, tenant_id, order_id).await?;
            previous_station = closed.last().map(|m| m.station.clone());
            OrderStationMetrics::open(&mut tx, tenant_id, order_id, station, sla_target).await?;
            tx.commit().await?;
        }

        Order::update_current_station(&self.pool, tenant_id, order_id, Some(station)).await?;

        self.publish_breaches(tenant_id, order_id, &closed).await;

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "order".to_string(),
                entity_id: order_id.to_string(),
                action: "station.routed".to_string(),
                before_state: Some(json!({ "station": previous_station })),
                after_state: Some(json!({ "station": station.to_string() })),
                actor: "automation".to_string(),
            },
        )
        .await?;

        self.publisher
            .publish(
                events::ORDER_STATION_ROUTED,
                json!({
                    "tenant_id": tenant_id,
                    "order_id": order_id,
                    "station": station.to_string(),
                    "sla_target_minutes": sla_target,
                }),
            )
            .await
            .ok();

        log_station_operation(
            "route",
            Some(order_id),
            Some(&station.to_string()),
            "routed",
            None,
        );

        Ok(RouteOutcome { routed: true })
    }

    /// Close all open intervals without opening a new one. Used when an
    /// order reaches a terminal state or a state no station owns.
    pub async fn close_residency(
        &self,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Vec<OrderStationMetrics>, sqlx::Error> {
        let closed;
        {
            let mut tx = self.pool.begin().await?;
            closed = OrderStationMetrics::close_all_open(&mut tx, tenant_id, order_id).await?;
            tx.commit().await?;
        }

        if !closed.is_empty() {
            Order::update_current_station(&self.pool, tenant_id, order_id, None).await?;
            self.publish_breaches(tenant_id, order_id, &closed).await;
            for metrics in &closed {
                log_station_operation(
                    "close",
                    Some(order_id),
                    Some(&metrics.station),
                    "closed",
                    metrics.duration_minutes.map(i64::from),
                );
            }
        }

        Ok(closed)
    }

    async fn publish_breaches(
        &self,
        tenant_id: Uuid,
        order_id: i64,
        closed: &[OrderStationMetrics],
    ) {
        for metrics in closed.iter().filter(|m| m.breached) {
            self.publisher
                .publish(
                    events::ORDER_SLA_BREACHED,
                    json!({
                        "tenant_id": tenant_id,
                        "order_id": order_id,
                        "station": metrics.station,
                        "duration_minutes": metrics.duration_minutes,
                        "sla_target_minutes": metrics.sla_target_minutes,
                    }),
                )
                .await
                .ok();
        }
    }
}
