//! # Data Layer
//!
//! Tenant-scoped sqlx models for the fulfillment pipeline. `core` holds the
//! row-per-entity write models; `insights` holds the analytics read models
//! backing the query surface.

pub mod core;
pub mod insights;

pub use self::core::*;
