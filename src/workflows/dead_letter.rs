//! # Dead-Letter Boundary
//!
//! Failure boundary wrapped around every workflow entry point. On any
//! error the attempt is captured to the DLQ with its trigger payload and
//! the error is re-raised — the caller sees the failure; the DLQ exists
//! for asynchronous inspection and reprocessing, not to swallow errors.
//! Resolution is strictly operator-driven; there is no in-process retry.

use serde_json::json;
use sqlx::PgPool;
use std::future::Future;
use uuid::Uuid;

use super::errors::WorkflowError;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::log_error;
use crate::models::{DeadLetterEntry, NewDeadLetterEntry};

#[derive(Clone)]
pub struct DeadLetterBoundary {
    pool: PgPool,
    publisher: EventPublisher,
}

impl DeadLetterBoundary {
    pub fn new(pool: PgPool, publisher: EventPublisher) -> Self {
        Self { pool, publisher }
    }

    /// Run a workflow body inside the failure boundary
    pub async fn run<T, Fut>(
        &self,
        workflow_name: &str,
        tenant_id: Option<Uuid>,
        trigger_payload: serde_json::Value,
        body: Fut,
    ) -> Result<T, WorkflowError>
    where
        Fut: Future<Output = Result<T, WorkflowError>>,
    {
        match body.await {
            Ok(value) => Ok(value),
            Err(error) => {
                let message = error.to_string();
                log_error("workflow", workflow_name, &message, None);

                // A DLQ write failure must not mask the original error
                match DeadLetterEntry::create(
                    &self.pool,
                    NewDeadLetterEntry {
                        tenant_id,
                        workflow_name: workflow_name.to_string(),
                        trigger_payload,
                        error_message: message.clone(),
                    },
                )
                .await
                {
                    Ok(entry) => {
                        self.publisher
                            .publish(
                                events::WORKFLOW_DEAD_LETTERED,
                                json!({
                                    "entry_id": entry.entry_id,
                                    "workflow_name": workflow_name,
                                    "error": message,
                                }),
                            )
                            .await
                            .ok();
                    }
                    Err(dlq_error) => {
                        log_error(
                            "workflow",
                            workflow_name,
                            &dlq_error.to_string(),
                            Some("failed to write dead letter entry"),
                        );
                    }
                }

                Err(error)
            }
        }
    }
}
