use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::errors::{StateMachineError, StateMachineResult};
use super::states::{InternalOrderState, StationType, TriggeredBy};
use crate::constants::events;
use crate::events::EventPublisher;
use crate::models::{AuditEntry, NewAuditEntry, NewOrderInternalEvent, Order, OrderInternalEvent};
use crate::routing::StationRouter;

/// Result of one advance call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvanceOutcome {
    pub updated: bool,
    pub station: Option<StationType>,
}

/// Order state machine: applies normalized transitions, appends the
/// timeline entry, and hands station ownership to the router.
///
/// The transition itself is unconditional — provider mappings are the
/// source of truth for what occurs. The adjacency table is consulted only
/// to flag out-of-sequence edges on the timeline row, never to reject them.
pub struct OrderStateMachine {
    order: Order,
    pool: PgPool,
    publisher: EventPublisher,
    router: Arc<StationRouter>,
}

impl OrderStateMachine {
    pub fn new(
        order: Order,
        pool: PgPool,
        publisher: EventPublisher,
        router: Arc<StationRouter>,
    ) -> Self {
        Self {
            order,
            pool,
            publisher,
            router,
        }
    }

    /// Current persisted state of the order
    pub fn current_state(&self) -> StateMachineResult<InternalOrderState> {
        self.order
            .state()
            .map_err(|_| StateMachineError::InvalidStoredState {
                order_id: self.order.order_id,
                state: self.order.current_state.clone(),
            })
    }

    /// Advance the order to `to_state`.
    ///
    /// `None` is a no-op (unmapped status). Otherwise the persisted state is
    /// updated, a timeline entry appended, the state change audited, and —
    /// when a station is implied by the static routing table or overridden
    /// by the mapping — the station router invoked. States no station owns
    /// close any open residency instead.
    pub async fn advance(
        &mut self,
        to_state: Option<InternalOrderState>,
        station_override: Option<StationType>,
    ) -> StateMachineResult<AdvanceOutcome> {
        let Some(to_state) = to_state else {
            return Ok(AdvanceOutcome {
                updated: false,
                station: None,
            });
        };

        let from_state = self.current_state()?;
        let tenant_id = self.order.tenant_id;
        let order_id = self.order.order_id;

        let out_of_sequence = !from_state.can_transition_to(to_state);
        if out_of_sequence {
            tracing::warn!(
                order_id = order_id,
                from_state = %from_state,
                to_state = %to_state,
                "Applying out-of-sequence transition"
            );
        }

        let updated = Order::update_state(&self.pool, tenant_id, order_id, to_state).await?;
        if updated == 0 {
            return Err(StateMachineError::OrderNotFound {
                tenant_id: tenant_id.to_string(),
                order_id,
            });
        }

        let station = station_override.or_else(|| to_state.station());

        let metadata = out_of_sequence.then(|| json!({ "out_of_sequence": true }));
        OrderInternalEvent::create(
            &self.pool,
            NewOrderInternalEvent {
                tenant_id,
                order_id,
                from_state: Some(from_state),
                to_state,
                station,
                triggered_by: TriggeredBy::Automation,
                metadata,
            },
        )
        .await?;

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "order".to_string(),
                entity_id: order_id.to_string(),
                action: "order.state_advanced".to_string(),
                before_state: Some(json!({ "state": from_state.to_string() })),
                after_state: Some(json!({ "state": to_state.to_string() })),
                actor: TriggeredBy::Automation.to_string(),
            },
        )
        .await?;

        match station {
            Some(station) => {
                self.router
                    .route(tenant_id, order_id, station)
                    .await
                    .map_err(|e| StateMachineError::RoutingFailed {
                        order_id,
                        station: station.to_string(),
                        message: e.to_string(),
                    })?;
            }
            None => {
                // In-transit and terminal states release station ownership
                self.router.close_residency(tenant_id, order_id).await?;
            }
        }

        self.publisher
            .publish(
                events::ORDER_STATE_ADVANCED,
                json!({
                    "tenant_id": tenant_id,
                    "order_id": order_id,
                    "from_state": from_state.to_string(),
                    "to_state": to_state.to_string(),
                    "station": station.map(|s| s.to_string()),
                    "out_of_sequence": out_of_sequence,
                }),
            )
            .await
            .ok();

        self.order.current_state = to_state.to_string();
        self.order.current_station = station.map(|s| s.to_string());

        Ok(AdvanceOutcome {
            updated: true,
            station,
        })
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn order_id(&self) -> i64 {
        self.order.order_id
    }
}
