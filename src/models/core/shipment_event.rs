//! # Shipment Event Model
//!
//! Immutable record of one carrier status update. Created once per inbound
//! update and never mutated; the resolved internal state is written at
//! insert time (null when no mapping applied) so the raw event survives
//! even when no transition occurs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state_machine::{IngestionMode, InternalOrderState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ShipmentEvent {
    pub event_id: i64,
    pub tenant_id: Uuid,
    pub tracking_number: String,
    pub carrier_code: String,
    pub provider_status: String,
    pub internal_state: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub ingestion_mode: String,
    pub raw_payload: serde_json::Value,
    pub created_at: NaiveDateTime,
}

/// New ShipmentEvent for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipmentEvent {
    pub tenant_id: Uuid,
    pub tracking_number: String,
    pub carrier_code: String,
    pub provider_status: String,
    pub internal_state: Option<InternalOrderState>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub ingestion_mode: IngestionMode,
    pub raw_payload: serde_json::Value,
}

impl ShipmentEvent {
    pub async fn create(
        pool: &PgPool,
        new_event: NewShipmentEvent,
    ) -> Result<ShipmentEvent, sqlx::Error> {
        sqlx::query_as::<_, ShipmentEvent>(
            r#"
            INSERT INTO fulfillment_shipment_events
            (tenant_id, tracking_number, carrier_code, provider_status, internal_state,
             location, description, occurred_at, ingestion_mode, raw_payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING *
            "#,
        )
        .bind(new_event.tenant_id)
        .bind(new_event.tracking_number)
        .bind(new_event.carrier_code)
        .bind(new_event.provider_status)
        .bind(new_event.internal_state.map(|s| s.to_string()))
        .bind(new_event.location)
        .bind(new_event.description)
        .bind(new_event.occurred_at)
        .bind(new_event.ingestion_mode.to_string())
        .bind(new_event.raw_payload)
        .fetch_one(pool)
        .await
    }

    /// Event history for a tracking number, oldest first
    pub async fn list_by_tracking_number(
        pool: &PgPool,
        tenant_id: Uuid,
        tracking_number: &str,
    ) -> Result<Vec<ShipmentEvent>, sqlx::Error> {
        sqlx::query_as::<_, ShipmentEvent>(
            r#"
            SELECT * FROM fulfillment_shipment_events
            WHERE tenant_id = $1 AND tracking_number = $2
            ORDER BY occurred_at ASC, event_id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(tracking_number)
        .fetch_all(pool)
        .await
    }

    /// Count events stored without a resolved internal state. Surfaces
    /// mapping-table gaps that would otherwise be visible only by absence.
    pub async fn count_unmapped(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM fulfillment_shipment_events
            WHERE tenant_id = $1 AND internal_state IS NULL
            "#,
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
