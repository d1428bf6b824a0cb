//! # Ingestion Entry Points
//!
//! The three ways shipment events enter the pipeline: structured event
//! arrays (API push), CSV uploads, and free-text email bodies. All three
//! funnel into the shipment event processor and return the same structured
//! `{processed, skipped, errors}` summary.

pub mod csv;
pub mod email;

use std::sync::Arc;
use uuid::Uuid;

use crate::config::IngestionConfig;
use crate::logging::log_ingestion_operation;
use crate::state_machine::IngestionMode;
use crate::workflows::errors::WorkflowError;
use crate::workflows::event_processor::ShipmentEventProcessor;
use crate::workflows::types::{InboundEvent, IngestSummary};

pub struct IngestionService {
    processor: Arc<ShipmentEventProcessor>,
    config: IngestionConfig,
}

impl IngestionService {
    pub fn new(processor: Arc<ShipmentEventProcessor>, config: IngestionConfig) -> Self {
        Self { processor, config }
    }

    /// Structured event array with an explicit ingestion mode tag
    pub async fn ingest_events(
        &self,
        tenant_id: Uuid,
        events: Vec<InboundEvent>,
        mode: IngestionMode,
    ) -> Result<IngestSummary, WorkflowError> {
        if events.len() > self.config.max_batch_size {
            return Err(WorkflowError::MalformedBatch(format!(
                "batch of {} events exceeds the limit of {}",
                events.len(),
                self.config.max_batch_size
            )));
        }

        let summary = self.processor.process_batch(tenant_id, events, mode).await;
        log_ingestion_operation(
            &mode.to_string(),
            Some(&tenant_id.to_string()),
            summary.processed,
            summary.skipped,
            summary.errors.len(),
        );
        Ok(summary)
    }

    /// CSV text with a header row. A header missing the required columns is
    /// a structural error before any data row; bad rows are counted and
    /// skipped.
    pub async fn ingest_csv(
        &self,
        tenant_id: Uuid,
        carrier_code: &str,
        csv_text: &str,
    ) -> Result<IngestSummary, WorkflowError> {
        let parsed = csv::parse_csv(csv_text, carrier_code)?;

        let mut summary = self
            .processor
            .process_batch(tenant_id, parsed.events, IngestionMode::Csv)
            .await;
        summary.errors.extend(parsed.row_errors);

        log_ingestion_operation(
            "csv",
            Some(&tenant_id.to_string()),
            summary.processed,
            summary.skipped,
            summary.errors.len(),
        );
        Ok(summary)
    }

    /// Free-text email body: tracking numbers extracted by pattern,
    /// status inferred by keyword scan
    pub async fn ingest_email(
        &self,
        tenant_id: Uuid,
        body: &str,
    ) -> Result<IngestSummary, WorkflowError> {
        let events = email::parse_email(body);

        let summary = if events.is_empty() {
            let mut summary = IngestSummary::default();
            summary.record_error(
                None,
                "no tracking number or recognizable status found in email body",
            );
            summary
        } else {
            self.processor
                .process_batch(tenant_id, events, IngestionMode::Email)
                .await
        };

        log_ingestion_operation(
            "email",
            Some(&tenant_id.to_string()),
            summary.processed,
            summary.skipped,
            summary.errors.len(),
        );
        Ok(summary)
    }
}
