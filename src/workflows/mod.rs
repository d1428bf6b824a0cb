//! # Workflow Layer
//!
//! Each workflow invocation is an independent unit of work: event
//! ingestion, state mapping, station routing, performance computation.
//! There is no in-process scheduler — concurrency comes from requests and
//! tenants executing workflows in parallel against tenant-scoped storage,
//! and the only cross-workflow synchronization primitive is the idempotency
//! ledger's uniqueness constraint. Workflows run to completion or land in
//! the dead-letter queue.

pub mod bootstrap;
pub mod configuration;
pub mod dead_letter;
pub mod errors;
pub mod event_processor;
pub mod idempotency;
pub mod types;

pub use bootstrap::FulfillmentSystem;
pub use configuration::ConfigurationSurface;
pub use dead_letter::DeadLetterBoundary;
pub use errors::{WorkflowError, WorkflowResult};
pub use event_processor::ShipmentEventProcessor;
pub use idempotency::{
    courier_performance_key, shipment_event_key, AlreadyDone, IdempotencyLedger,
};
pub use types::{InboundEvent, IngestError, IngestSummary};
