// State machine module for the order-fulfillment pipeline
//
// Closed enums make illegal states unrepresentable; the routing and
// adjacency tables are exhaustive matches so gaps surface at compile time.

pub mod errors;
pub mod order_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use order_state_machine::{AdvanceOutcome, OrderStateMachine};
pub use states::{IngestionMode, InternalOrderState, StationType, TriggeredBy};
