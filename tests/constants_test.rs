//! Tests for system constants and configuration defaults

use fulfillment_core::config::{FulfillmentConfig, SlaConfig};
use fulfillment_core::state_machine::{InternalOrderState, StationType};
use fulfillment_core::{status_groups, system, WorkflowOutcome};

#[test]
fn test_sla_defaults() {
    assert_eq!(system::SLA_CALL_CENTER_MINUTES, 60);
    assert_eq!(system::SLA_OPERATIONS_MINUTES, 240);
    assert_eq!(system::SLA_FINANCE_MINUTES, 1440);
    assert_eq!(system::SLA_RETURNS_MINUTES, 2880);

    let slas = SlaConfig::default();
    for station in StationType::ALL {
        assert_eq!(slas.target_for(station), station.default_sla_minutes());
    }
}

#[test]
fn test_scoring_window_defaults() {
    assert_eq!(system::PERFORMANCE_WINDOW_DAYS, 30);
    assert_eq!(system::ON_TIME_THRESHOLD_HOURS, 72.0);

    let config = FulfillmentConfig::default();
    assert_eq!(config.scoring.window_days, 30);
    assert_eq!(config.scoring.on_time_threshold_hours, 72.0);
}

#[test]
fn test_terminal_status_group() {
    for state in status_groups::TERMINAL_STATES {
        assert!(state.is_terminal());
        assert_eq!(state.station().is_some(), state == InternalOrderState::ReturnReceived);
    }
}

#[test]
fn test_in_transit_states_have_no_station() {
    for state in status_groups::IN_TRANSIT_STATES {
        assert!(state.is_in_transit());
        assert_eq!(state.station(), None);
    }
}

#[test]
fn test_workflow_outcome_strings() {
    assert_eq!(WorkflowOutcome::Succeeded.as_str(), "succeeded");
    assert_eq!(WorkflowOutcome::Skipped.as_str(), "skipped");
    assert_eq!(WorkflowOutcome::NoTransition.as_str(), "no_transition");
}
