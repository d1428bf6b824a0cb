//! # Email Ingestion
//!
//! Free-text extraction: tracking numbers are pulled via pattern matching
//! on common "tracking/awb/shipment/order: XXXX" phrasings, the status is
//! inferred by a first-match keyword scan, and one event is emitted per
//! distinct tracking number found.

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

use crate::workflows::types::InboundEvent;

/// Carrier attributed to email-sourced events; emails carry no carrier
/// identity, so only generic and tenant wildcard mappings can apply.
pub const EMAIL_CARRIER: &str = "unknown";

fn tracking_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:tracking|awb|shipment|order)\s*(?:number|no|num)?\s*[:#.\-]\s*([A-Za-z0-9][A-Za-z0-9\-]{4,})",
        )
        .expect("tracking pattern is valid")
    })
}

/// Status keywords scanned in priority order; the first match wins
const STATUS_KEYWORDS: [(&str, &str); 6] = [
    ("delivered", "delivered"),
    ("out for delivery", "out for delivery"),
    ("in transit", "in transit"),
    ("picked up", "picked up"),
    ("return", "return"),
    ("failed delivery", "failed delivery"),
];

/// Distinct tracking numbers in order of first appearance
pub fn extract_tracking_numbers(body: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in tracking_regex().captures_iter(body) {
        let number = capture[1].to_uppercase();
        if !seen.contains(&number) {
            seen.push(number);
        }
    }
    seen
}

/// First-match keyword scan over the body
pub fn infer_status(body: &str) -> Option<&'static str> {
    let lowered = body.to_lowercase();
    STATUS_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, status)| status)
}

/// Build one event per distinct tracking number. Empty when no tracking
/// number or no status keyword is present.
pub fn parse_email(body: &str) -> Vec<InboundEvent> {
    let Some(status) = infer_status(body) else {
        return Vec::new();
    };

    let occurred_at = Utc::now().naive_utc();
    extract_tracking_numbers(body)
        .into_iter()
        .map(|tracking_number| InboundEvent {
            tracking_number,
            carrier_code: EMAIL_CARRIER.to_string(),
            provider_status: status.to_string(),
            location: None,
            description: None,
            occurred_at,
            raw_payload: json!({ "email_body": body }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_common_phrasings() {
        let body = "Your shipment update.\n\
                    Tracking number: ABC12345\n\
                    AWB# XY-98765\n\
                    order no. 555123456";
        let numbers = extract_tracking_numbers(body);
        assert_eq!(numbers, vec!["ABC12345", "XY-98765", "555123456"]);
    }

    #[test]
    fn test_duplicate_tracking_numbers_emit_once() {
        let body = "tracking: T12345 ... again tracking: T12345. Delivered.";
        let events = parse_email(body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tracking_number, "T12345");
    }

    #[test]
    fn test_status_scan_priority_order() {
        // "delivered" wins over "in transit" even when both appear
        let body = "tracking: T11111 was in transit and is now delivered";
        assert_eq!(infer_status(body), Some("delivered"));

        let body = "tracking: T11111 left the hub, in transit to you";
        assert_eq!(infer_status(body), Some("in transit"));
    }

    #[test]
    fn test_return_keyword() {
        let body = "awb: R22222 is being returned to the shipper";
        assert_eq!(infer_status(body), Some("return"));
    }

    #[test]
    fn test_no_status_keyword_yields_no_events() {
        let body = "tracking: T33333 — thank you for your purchase";
        assert!(parse_email(body).is_empty());
    }

    #[test]
    fn test_no_tracking_numbers_yields_no_events() {
        let body = "your package was delivered today";
        assert!(parse_email(body).is_empty());
    }

    #[test]
    fn test_events_carry_unknown_carrier() {
        let body = "shipment: S44444 picked up by courier";
        let events = parse_email(body);
        assert_eq!(events[0].carrier_code, EMAIL_CARRIER);
        assert_eq!(events[0].provider_status, "picked up");
    }
}
