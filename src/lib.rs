#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fulfillment Core
//!
//! Rust core for a multi-tenant commerce platform's order-fulfillment
//! backbone: third-party shipment status events are ingested, translated
//! into an internal order-state machine, routed through operational
//! stations with SLA enforcement, and aggregated into courier performance
//! scores that drive carrier routing recommendations.
//!
//! ## Pipeline
//!
//! Raw events (API push, CSV upload, email text) flow through the status
//! normalizer into the order state machine, which hands station ownership
//! to the router; the courier performance engine consumes the resulting
//! shipment history asynchronously. Every transition passes the idempotency
//! ledger guard and writes to the audit log; failures land in the
//! dead-letter queue instead of escaping the workflow boundary.
//!
//! ## Module Organization
//!
//! - [`models`] - Tenant-scoped data layer (orders, events, intervals, rollups)
//! - [`state_machine`] - Internal order states, stations, and the advance driver
//! - [`normalizer`] - Provider status translation with tenant rule precedence
//! - [`routing`] - Station residency intervals and SLA tracking
//! - [`performance`] - Courier scoring and smart routing recommendations
//! - [`ingestion`] - API/CSV/email entry points
//! - [`workflows`] - Idempotency ledger, dead-letter boundary, event pipeline
//! - [`config`] - YAML configuration with environment overrides
//! - [`database`] - Pool construction and migration runner
//! - [`events`] - In-process lifecycle event publisher
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fulfillment_core::config::ConfigManager;
//! use fulfillment_core::workflows::FulfillmentSystem;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let system = FulfillmentSystem::connect(manager.config()).await?;
//!
//! let tenant = uuid::Uuid::new_v4();
//! let summary = system
//!     .ingestion()
//!     .ingest_csv(tenant, "aramex", "tracking,status\nT1,delivered\n")
//!     .await?;
//! println!("processed {} events", summary.processed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod ingestion;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod performance;
pub mod routing;
pub mod state_machine;
pub mod workflows;

pub use config::{ConfigManager, DatabaseConfig, FulfillmentConfig, ScoringConfig, SlaConfig};
pub use constants::{status_groups, system, WorkflowOutcome};
pub use error::{FulfillmentError, Result};
pub use state_machine::{IngestionMode, InternalOrderState, StationType, TriggeredBy};
pub use workflows::{FulfillmentSystem, IngestSummary, WorkflowError};
