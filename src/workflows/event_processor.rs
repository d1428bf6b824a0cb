//! # Shipment Event Processor
//!
//! The ingestion pipeline: for each inbound carrier update — idempotency
//! guard, raw event persistence, status normalization, state machine
//! advance, station routing, shipment timing stamps — with the ledger row
//! written as the final step of a successful pass.
//!
//! Per-event failures are captured by the dead-letter boundary and recorded
//! in the batch summary; one bad event never aborts the rest of the batch.

use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::dead_letter::DeadLetterBoundary;
use super::errors::WorkflowError;
use super::idempotency::{shipment_event_key, IdempotencyLedger};
use super::types::{InboundEvent, IngestSummary};
use crate::constants::{events, workflows, WorkflowOutcome};
use crate::events::EventPublisher;
use crate::logging::log_workflow_operation;
use crate::models::{NewShipmentEvent, Order, Shipment, ShipmentEvent};
use crate::normalizer::StatusNormalizer;
use crate::routing::StationRouter;
use crate::state_machine::{IngestionMode, InternalOrderState, OrderStateMachine};

/// Per-event verdict inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessOutcome {
    Processed,
    Skipped,
    OrderNotFound,
}

pub struct ShipmentEventProcessor {
    pool: PgPool,
    normalizer: Arc<StatusNormalizer>,
    router: Arc<StationRouter>,
    publisher: EventPublisher,
    ledger: IdempotencyLedger,
    boundary: DeadLetterBoundary,
}

impl ShipmentEventProcessor {
    pub fn new(
        pool: PgPool,
        normalizer: Arc<StatusNormalizer>,
        router: Arc<StationRouter>,
        publisher: EventPublisher,
        ledger: IdempotencyLedger,
        boundary: DeadLetterBoundary,
    ) -> Self {
        Self {
            pool,
            normalizer,
            router,
            publisher,
            ledger,
            boundary,
        }
    }

    /// Process a batch of inbound events. Returns the structured summary;
    /// per-event errors are recorded, dead-lettered, and do not stop the
    /// batch.
    pub async fn process_batch(
        &self,
        tenant_id: Uuid,
        inbound: Vec<InboundEvent>,
        mode: IngestionMode,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for event in inbound {
            let tracking = event.tracking_number.clone();
            let payload = json!({ "event": &event, "mode": mode.to_string() });

            let result = self
                .boundary
                .run(
                    workflows::SHIPMENT_EVENT,
                    Some(tenant_id),
                    payload,
                    self.process_one(tenant_id, &event, mode),
                )
                .await;

            match result {
                Ok(ProcessOutcome::Processed) => summary.record_processed(),
                Ok(ProcessOutcome::Skipped) => summary.record_skipped(),
                Ok(ProcessOutcome::OrderNotFound) => {
                    summary.record_error(
                        Some(tracking),
                        "no order matches this tracking number for the tenant",
                    );
                }
                Err(error) => {
                    summary.record_error(Some(tracking), error.to_string());
                }
            }
        }

        summary
    }

    async fn process_one(
        &self,
        tenant_id: Uuid,
        event: &InboundEvent,
        mode: IngestionMode,
    ) -> Result<ProcessOutcome, WorkflowError> {
        let key = shipment_event_key(
            tenant_id,
            &event.tracking_number,
            &event.provider_status,
            event.occurred_at,
        );

        if self.ledger.try_begin(&key).await?.already_done {
            self.publisher
                .publish(
                    events::EVENT_SKIPPED_DUPLICATE,
                    json!({ "tenant_id": tenant_id, "tracking_number": event.tracking_number }),
                )
                .await
                .ok();
            log_workflow_operation(
                workflows::SHIPMENT_EVENT,
                Some(&tenant_id.to_string()),
                Some(&key),
                "skipped",
                Some("idempotency key already recorded"),
            );
            return Ok(ProcessOutcome::Skipped);
        }

        let normalized = self
            .normalizer
            .normalize(tenant_id, &event.carrier_code, &event.provider_status)
            .await?;

        // The raw event is persisted before anything else and never dropped,
        // whether or not a mapping applied
        ShipmentEvent::create(
            &self.pool,
            NewShipmentEvent {
                tenant_id,
                tracking_number: event.tracking_number.clone(),
                carrier_code: event.carrier_code.clone(),
                provider_status: event.provider_status.clone(),
                internal_state: normalized.map(|n| n.internal_state),
                location: event.location.clone(),
                description: event.description.clone(),
                occurred_at: event.occurred_at,
                ingestion_mode: mode,
                raw_payload: event.raw_payload.clone(),
            },
        )
        .await?;

        self.publisher
            .publish(
                events::EVENT_RECEIVED,
                json!({
                    "tenant_id": tenant_id,
                    "tracking_number": event.tracking_number,
                    "carrier_code": event.carrier_code,
                    "provider_status": event.provider_status,
                    "mode": mode.to_string(),
                }),
            )
            .await
            .ok();

        let Some(normalized) = normalized else {
            // Unmapped status: stored, no transition attempted. The ledger
            // row still lands so redeliveries of the same raw event skip.
            self.publisher
                .publish(
                    events::EVENT_UNMAPPED_STATUS,
                    json!({
                        "tenant_id": tenant_id,
                        "carrier_code": event.carrier_code,
                        "provider_status": event.provider_status,
                    }),
                )
                .await
                .ok();
            self.ledger
                .complete(&key, workflows::SHIPMENT_EVENT, WorkflowOutcome::NoTransition)
                .await?;
            return Ok(ProcessOutcome::Processed);
        };

        let Some(order) =
            Order::find_by_tracking_number(&self.pool, tenant_id, &event.tracking_number).await?
        else {
            // Rejected, not dead-lettered: no ledger row is written so the
            // event succeeds on redelivery once the order exists
            return Ok(ProcessOutcome::OrderNotFound);
        };
        let order_id = order.order_id;

        let mut machine = OrderStateMachine::new(
            order,
            self.pool.clone(),
            self.publisher.clone(),
            Arc::clone(&self.router),
        );
        machine
            .advance(Some(normalized.internal_state), normalized.triggers_station)
            .await?;

        self.stamp_shipment_timing(tenant_id, order_id, normalized.internal_state, event)
            .await?;

        // Final step: only a fully-applied transition marks the key done
        self.ledger
            .complete(&key, workflows::SHIPMENT_EVENT, WorkflowOutcome::Succeeded)
            .await?;

        log_workflow_operation(
            workflows::SHIPMENT_EVENT,
            Some(&tenant_id.to_string()),
            Some(&key),
            "succeeded",
            None,
        );

        Ok(ProcessOutcome::Processed)
    }

    /// Keep the shipment timing record in step with the lifecycle states
    /// the performance engine aggregates over
    async fn stamp_shipment_timing(
        &self,
        tenant_id: Uuid,
        order_id: i64,
        to_state: InternalOrderState,
        event: &InboundEvent,
    ) -> Result<(), WorkflowError> {
        let at = event.occurred_at;
        match to_state {
            InternalOrderState::Shipped => {
                Shipment::mark_picked_up(&self.pool, tenant_id, order_id, at).await?;
            }
            InternalOrderState::Delivered => {
                Shipment::mark_delivered(&self.pool, tenant_id, order_id, at).await?;
            }
            InternalOrderState::ReturnReceived => {
                Shipment::mark_returned(&self.pool, tenant_id, order_id, at).await?;
            }
            InternalOrderState::FinanceSettled => {
                Shipment::mark_cod_collected(&self.pool, tenant_id, order_id, at).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
