//! # Order Internal Event Model
//!
//! Append-only timeline of order state transitions. Each row captures a
//! `from_state -> to_state` change, the station that took ownership, who
//! triggered it, and transition metadata.
//!
//! Maps to `fulfillment_order_internal_events`:
//!
//! ```sql
//! CREATE TABLE fulfillment_order_internal_events (
//!   event_id BIGSERIAL PRIMARY KEY,
//!   tenant_id UUID NOT NULL,
//!   order_id BIGINT NOT NULL,
//!   from_state VARCHAR,
//!   to_state VARCHAR NOT NULL,
//!   station VARCHAR,
//!   triggered_by VARCHAR NOT NULL,
//!   metadata JSONB,
//!   created_at TIMESTAMP NOT NULL
//! );
//! ```
//!
//! Rows are never updated or deleted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state_machine::{InternalOrderState, StationType, TriggeredBy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderInternalEvent {
    pub event_id: i64,
    pub tenant_id: Uuid,
    pub order_id: i64,
    pub from_state: Option<String>,
    pub to_state: String,
    pub station: Option<String>,
    pub triggered_by: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

/// New OrderInternalEvent for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderInternalEvent {
    pub tenant_id: Uuid,
    pub order_id: i64,
    pub from_state: Option<InternalOrderState>,
    pub to_state: InternalOrderState,
    pub station: Option<StationType>,
    pub triggered_by: TriggeredBy,
    pub metadata: Option<serde_json::Value>,
}

impl OrderInternalEvent {
    pub async fn create(
        pool: &PgPool,
        new_event: NewOrderInternalEvent,
    ) -> Result<OrderInternalEvent, sqlx::Error> {
        sqlx::query_as::<_, OrderInternalEvent>(
            r#"
            INSERT INTO fulfillment_order_internal_events
            (tenant_id, order_id, from_state, to_state, station, triggered_by, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING *
            "#,
        )
        .bind(new_event.tenant_id)
        .bind(new_event.order_id)
        .bind(new_event.from_state.map(|s| s.to_string()))
        .bind(new_event.to_state.to_string())
        .bind(new_event.station.map(|s| s.to_string()))
        .bind(new_event.triggered_by.to_string())
        .bind(new_event.metadata)
        .fetch_one(pool)
        .await
    }

    /// Full timeline for an order, oldest first
    pub async fn list_by_order(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Vec<OrderInternalEvent>, sqlx::Error> {
        sqlx::query_as::<_, OrderInternalEvent>(
            r#"
            SELECT * FROM fulfillment_order_internal_events
            WHERE tenant_id = $1 AND order_id = $2
            ORDER BY event_id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    /// Most recent timeline entry for an order
    pub async fn latest_for_order(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Option<OrderInternalEvent>, sqlx::Error> {
        sqlx::query_as::<_, OrderInternalEvent>(
            r#"
            SELECT * FROM fulfillment_order_internal_events
            WHERE tenant_id = $1 AND order_id = $2
            ORDER BY event_id DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }
}
