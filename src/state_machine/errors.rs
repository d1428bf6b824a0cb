//! # State Machine Error Types
//!
//! Structured error types for order state transitions using thiserror
//! instead of `Box<dyn Error>` patterns.

use thiserror::Error;

/// Errors raised while advancing an order through the state graph
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Database error during transition: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Order not found: {order_id} for tenant {tenant_id}")]
    OrderNotFound { tenant_id: String, order_id: i64 },

    #[error("Invalid state stored for order {order_id}: {state}")]
    InvalidStoredState { order_id: i64, state: String },

    #[error("Routing failed for order {order_id} to station {station}: {message}")]
    RoutingFailed {
        order_id: i64,
        station: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
