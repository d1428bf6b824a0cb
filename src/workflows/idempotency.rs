//! # Idempotency Ledger
//!
//! Deduplication guard for workflow attempts. Keys are deterministic
//! strings built from stable inputs; the ledger's unique constraint is the
//! correctness mechanism and the `try_begin` pre-check only an optimization
//! (see `models::workflow_execution`).

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::constants::WorkflowOutcome;
use crate::models::WorkflowExecution;

/// Verdict of the pre-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyDone {
    pub already_done: bool,
}

#[derive(Clone)]
pub struct IdempotencyLedger {
    pool: PgPool,
}

impl IdempotencyLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a ledger row exists for this key. Callers observing
    /// `already_done` must skip all side effects and report skipped.
    pub async fn try_begin(&self, key: &str) -> Result<AlreadyDone, sqlx::Error> {
        let exists = WorkflowExecution::exists(&self.pool, key).await?;
        Ok(AlreadyDone {
            already_done: exists,
        })
    }

    /// Record completion. Called as the FINAL step of a successful
    /// workflow; returns false when a concurrent attempt inserted first,
    /// which callers treat identically to "already done".
    pub async fn complete(
        &self,
        key: &str,
        workflow_name: &str,
        outcome: WorkflowOutcome,
    ) -> Result<bool, sqlx::Error> {
        WorkflowExecution::record(&self.pool, key, workflow_name, outcome.as_str()).await
    }
}

/// Ledger key for one shipment event: stable across redeliveries of the
/// same (tracking, status, occurrence) triple.
pub fn shipment_event_key(
    tenant_id: Uuid,
    tracking_number: &str,
    provider_status: &str,
    occurred_at: NaiveDateTime,
) -> String {
    format!(
        "shipment_event:{tenant_id}:{tracking_number}:{provider_status}:{}",
        occurred_at.format("%Y-%m-%dT%H:%M:%S")
    )
}

/// Ledger key for one courier-performance run: at most one per tenant per day
pub fn courier_performance_key(tenant_id: Uuid, date: NaiveDate) -> String {
    format!("courier_performance:{tenant_id}:{date}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_shipment_event_key_is_deterministic() {
        let tenant = Uuid::parse_str("b0e4a1c2-9b3d-4f5e-8a7b-1c2d3e4f5a6b").unwrap();
        let at =
            NaiveDateTime::parse_from_str("2026-08-01 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let a = shipment_event_key(tenant, "T1", "DEL", at);
        let b = shipment_event_key(tenant, "T1", "DEL", at);
        assert_eq!(a, b);
        assert_eq!(
            a,
            "shipment_event:b0e4a1c2-9b3d-4f5e-8a7b-1c2d3e4f5a6b:T1:DEL:2026-08-01T10:30:00"
        );
    }

    #[test]
    fn test_distinct_inputs_produce_distinct_keys() {
        let tenant = Uuid::new_v4();
        let at =
            NaiveDateTime::parse_from_str("2026-08-01 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let base = shipment_event_key(tenant, "T1", "DEL", at);
        assert_ne!(base, shipment_event_key(tenant, "T2", "DEL", at));
        assert_ne!(base, shipment_event_key(tenant, "T1", "OFD", at));
        assert_ne!(
            base,
            shipment_event_key(tenant, "T1", "DEL", at + chrono::Duration::seconds(1))
        );
    }

    #[test]
    fn test_courier_performance_key_shape() {
        let tenant = Uuid::parse_str("b0e4a1c2-9b3d-4f5e-8a7b-1c2d3e4f5a6b").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert_eq!(
            courier_performance_key(tenant, date),
            "courier_performance:b0e4a1c2-9b3d-4f5e-8a7b-1c2d3e4f5a6b:2026-08-01"
        );
    }
}
