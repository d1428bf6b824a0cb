//! # Workflow Error Types
//!
//! Structured errors for the workflow layer. These cross the dead-letter
//! boundary: anything that escapes a workflow body is captured with its
//! payload and re-raised to the caller.

use thiserror::Error;

use crate::state_machine::StateMachineError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
