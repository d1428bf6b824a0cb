//! Shared workflow input/output types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One inbound carrier status update, channel-agnostic. The ingestion
/// entry points (structured API push, CSV resolver, email extractor) all
/// produce this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub tracking_number: String,
    pub carrier_code: String,
    pub provider_status: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub raw_payload: serde_json::Value,
}

/// Per-event failure detail in a batch summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestError {
    pub tracking_number: Option<String>,
    pub message: String,
}

/// Structured batch result: ingestion never aborts a whole batch on the
/// first bad row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: Vec<IngestError>,
}

impl IngestSummary {
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_error(&mut self, tracking_number: Option<String>, message: impl Into<String>) {
        self.errors.push(IngestError {
            tracking_number,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates() {
        let mut summary = IngestSummary::default();
        summary.record_processed();
        summary.record_processed();
        summary.record_skipped();
        summary.record_error(Some("T9".to_string()), "order not found");

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].tracking_number.as_deref(), Some("T9"));
    }
}
