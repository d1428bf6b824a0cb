//! # CSV Ingestion
//!
//! Header-driven CSV parsing with heuristic column resolution. A header row
//! missing both a tracking-number-like and a status-like column is a
//! structural error raised before any data row is processed; individual bad
//! rows are skipped and counted, never fatal.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::json;

use crate::workflows::errors::WorkflowError;
use crate::workflows::types::{InboundEvent, IngestError};

/// Resolved column positions for one CSV upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumnMap {
    pub tracking: usize,
    pub status: usize,
    pub occurred: Option<usize>,
    pub location: Option<usize>,
    pub description: Option<usize>,
}

/// Outcome of parsing one CSV payload
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub events: Vec<InboundEvent>,
    pub row_errors: Vec<IngestError>,
}

/// Heuristically match header names to columns. Tracking and status
/// columns are required; the rest are optional.
pub fn resolve_columns(headers: &[String]) -> Result<CsvColumnMap, WorkflowError> {
    let find = |needles: &[&str]| {
        headers.iter().position(|h| {
            let h = h.trim().to_lowercase();
            needles.iter().any(|n| h.contains(n))
        })
    };

    let tracking = find(&["tracking", "awb", "waybill"]);
    let status = find(&["status", "state"]);

    match (tracking, status) {
        (Some(tracking), Some(status)) => Ok(CsvColumnMap {
            tracking,
            status,
            occurred: find(&["date", "time", "timestamp"]),
            location: find(&["location", "city"]),
            description: find(&["description", "remark", "note"]),
        }),
        (None, _) => Err(WorkflowError::MalformedBatch(
            "CSV header has no tracking-number-like column (tracking/awb/waybill)".to_string(),
        )),
        (_, None) => Err(WorkflowError::MalformedBatch(
            "CSV header has no status-like column (status/state)".to_string(),
        )),
    }
}

/// Parse CSV text into inbound events. The first line is the header row;
/// rows missing a tracking number or status are skipped and recorded.
pub fn parse_csv(text: &str, carrier_code: &str) -> Result<ParsedCsv, WorkflowError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err(WorkflowError::MalformedBatch("CSV payload is empty".to_string()));
    };
    let headers = split_csv_line(header_line);
    let columns = resolve_columns(&headers)?;

    let mut events = Vec::new();
    let mut row_errors = Vec::new();

    for (line_number, line) in lines {
        let cells = split_csv_line(line);
        let cell = |idx: usize| cells.get(idx).map(|c| c.trim()).unwrap_or("");

        let tracking_number = cell(columns.tracking);
        let provider_status = cell(columns.status);
        if tracking_number.is_empty() || provider_status.is_empty() {
            row_errors.push(IngestError {
                tracking_number: (!tracking_number.is_empty())
                    .then(|| tracking_number.to_string()),
                message: format!(
                    "row {}: missing tracking number or status",
                    line_number + 1
                ),
            });
            continue;
        }

        let occurred_at = columns
            .occurred
            .and_then(|idx| parse_timestamp(cell(idx)))
            .unwrap_or_else(|| Utc::now().naive_utc());

        events.push(InboundEvent {
            tracking_number: tracking_number.to_string(),
            carrier_code: carrier_code.to_string(),
            provider_status: provider_status.to_string(),
            location: columns
                .location
                .map(|idx| cell(idx).to_string())
                .filter(|s| !s.is_empty()),
            description: columns
                .description
                .map(|idx| cell(idx).to_string())
                .filter(|s| !s.is_empty()),
            occurred_at,
            raw_payload: json!({ "row": cells }),
        });
    }

    Ok(ParsedCsv { events, row_errors })
}

/// Split one CSV line, honoring double-quoted cells with escaped quotes
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Best-effort timestamp parsing across the formats carriers actually send
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.and_time(chrono::NaiveTime::MIN));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_columns_by_heuristic_names() {
        let map = resolve_columns(&headers(&[
            "AWB Number",
            "Shipment Status",
            "Event Date",
            "City",
            "Remarks",
        ]))
        .unwrap();
        assert_eq!(map.tracking, 0);
        assert_eq!(map.status, 1);
        assert_eq!(map.occurred, Some(2));
        assert_eq!(map.location, Some(3));
        assert_eq!(map.description, Some(4));
    }

    #[test]
    fn test_missing_tracking_column_is_structural_error() {
        let result = resolve_columns(&headers(&["Status", "Date"]));
        assert!(matches!(result, Err(WorkflowError::MalformedBatch(_))));
    }

    #[test]
    fn test_missing_status_column_is_structural_error() {
        let result = resolve_columns(&headers(&["Tracking Number", "Date"]));
        assert!(matches!(result, Err(WorkflowError::MalformedBatch(_))));
    }

    #[test]
    fn test_structural_error_raised_before_any_row() {
        let csv = "id,notes\n1,hello\n2,world\n";
        let result = parse_csv(csv, "aramex");
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_missing_required_cells_are_counted_not_fatal() {
        let csv = "tracking,status,date\n\
                   T1,delivered,2026-08-01 10:00:00\n\
                   ,delivered,2026-08-01 10:00:00\n\
                   T3,,2026-08-01 10:00:00\n\
                   T4,in transit,2026-08-01 11:00:00\n";
        let parsed = parse_csv(csv, "aramex").unwrap();
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.row_errors.len(), 2);
        assert_eq!(parsed.events[0].tracking_number, "T1");
        assert_eq!(parsed.events[1].tracking_number, "T4");
    }

    #[test]
    fn test_quoted_cells_with_commas() {
        let cells = split_csv_line(r#"T1,"delivered, left at door","Riyadh, KSA""#);
        assert_eq!(cells, vec!["T1", "delivered, left at door", "Riyadh, KSA"]);
    }

    #[test]
    fn test_escaped_quotes() {
        let cells = split_csv_line(r#"T1,"said ""delivered""""#);
        assert_eq!(cells, vec!["T1", r#"said "delivered""#]);
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2026-08-01 10:30:00").is_some());
        assert!(parse_timestamp("2026-08-01T10:30:00").is_some());
        assert!(parse_timestamp("2026-08-01").is_some());
        assert!(parse_timestamp("01/08/2026 10:30").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let csv = "tracking,status,date\nT1,delivered,someday\n";
        let parsed = parse_csv(csv, "aramex").unwrap();
        assert_eq!(parsed.events.len(), 1);
        // occurred_at defaulted; the row itself is still accepted
        assert!(parsed.row_errors.is_empty());
    }
}
