//! # System Constants
//!
//! Core constants and enums that define the operational boundaries of the
//! fulfillment pipeline: lifecycle event names, status groupings, and the
//! built-in defaults that configuration layers override.

use serde::{Deserialize, Serialize};

// Re-export state types for convenience
pub use crate::state_machine::{IngestionMode, InternalOrderState, StationType};

/// Core system events published on the in-process event bus
pub mod events {
    // Shipment event lifecycle
    pub const EVENT_RECEIVED: &str = "event.received";
    pub const EVENT_SKIPPED_DUPLICATE: &str = "event.skipped_duplicate";
    pub const EVENT_UNMAPPED_STATUS: &str = "event.unmapped_status";

    // Order lifecycle
    pub const ORDER_STATE_ADVANCED: &str = "order.state_advanced";
    pub const ORDER_STATION_ROUTED: &str = "order.station_routed";
    pub const ORDER_SLA_BREACHED: &str = "order.sla_breached";

    // Courier analytics
    pub const COURIER_PERFORMANCE_COMPUTED: &str = "courier.performance_computed";

    // Failure boundary
    pub const WORKFLOW_DEAD_LETTERED: &str = "workflow.dead_lettered";
}

/// Workflow names recorded in the idempotency ledger and the DLQ
pub mod workflows {
    pub const SHIPMENT_EVENT: &str = "shipment_event_processing";
    pub const COURIER_PERFORMANCE: &str = "courier_performance_computation";
    pub const CSV_INGESTION: &str = "csv_ingestion";
    pub const EMAIL_INGESTION: &str = "email_ingestion";
}

/// State groupings used by queue queries and SQL condition builders
pub mod status_groups {
    use crate::state_machine::InternalOrderState;

    /// States from which no further transition is expected
    pub const TERMINAL_STATES: [InternalOrderState; 3] = [
        InternalOrderState::FinanceSettled,
        InternalOrderState::Cancelled,
        InternalOrderState::ReturnReceived,
    ];

    /// States where the shipment is moving and no station owns the order
    pub const IN_TRANSIT_STATES: [InternalOrderState; 4] = [
        InternalOrderState::Shipped,
        InternalOrderState::InTransit,
        InternalOrderState::OutForDelivery,
        InternalOrderState::ReturnInTransit,
    ];
}

/// Built-in system defaults. Configuration resolves these at startup and
/// tenant overrides layer on top; workflow bodies never read them directly.
pub mod system {
    /// Default SLA target in minutes for the call center station
    pub const SLA_CALL_CENTER_MINUTES: i32 = 60;
    /// Default SLA target in minutes for the operations station
    pub const SLA_OPERATIONS_MINUTES: i32 = 240;
    /// Default SLA target in minutes for the finance station
    pub const SLA_FINANCE_MINUTES: i32 = 1440;
    /// Default SLA target in minutes for the returns station
    pub const SLA_RETURNS_MINUTES: i32 = 2880;

    /// Trailing window for courier performance aggregation
    pub const PERFORMANCE_WINDOW_DAYS: i64 = 30;
    /// Deliveries within this many hours of order creation count as on-time
    pub const ON_TIME_THRESHOLD_HOURS: f64 = 72.0;
}

/// Outcome recorded against a ledger row once a workflow completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Succeeded,
    Skipped,
    NoTransition,
}

impl WorkflowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowOutcome::Succeeded => "succeeded",
            WorkflowOutcome::Skipped => "skipped",
            WorkflowOutcome::NoTransition => "no_transition",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_sla_defaults() {
        assert_eq!(system::SLA_CALL_CENTER_MINUTES, 60);
        assert_eq!(system::SLA_OPERATIONS_MINUTES, 240);
        assert_eq!(system::SLA_FINANCE_MINUTES, 1440);
        assert_eq!(system::SLA_RETURNS_MINUTES, 2880);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(events::EVENT_RECEIVED, "event.received");
        assert_eq!(events::ORDER_STATE_ADVANCED, "order.state_advanced");
        assert_eq!(
            events::COURIER_PERFORMANCE_COMPUTED,
            "courier.performance_computed"
        );
    }

    #[test]
    fn test_terminal_states_are_terminal() {
        for state in status_groups::TERMINAL_STATES {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
    }
}
