//! # Built-in Status Mapping Defaults
//!
//! The default translation table applied when no tenant rule matches:
//! generic lifecycle vocabulary plus named-carrier status codes. Built once
//! at startup (optionally extended from configuration) and injected into
//! the normalizer; matching is case-insensitive.

use std::collections::HashMap;

use crate::config::DefaultMappingEntry;
use crate::state_machine::{InternalOrderState, StationType};

/// Resolution of a raw provider status against the default table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultMapping {
    pub internal_state: InternalOrderState,
    pub triggers_station: Option<StationType>,
    pub is_terminal: bool,
}

/// Case-insensitive default table: carrier-exact entries first, then the
/// generic lifecycle vocabulary.
#[derive(Debug, Default)]
pub struct DefaultMappingTable {
    carrier_exact: HashMap<(String, String), DefaultMapping>,
    generic: HashMap<String, DefaultMapping>,
}

impl DefaultMappingTable {
    /// The built-in table: generic lifecycle plus aramex/dhl/fedex quirks
    pub fn builtin() -> Self {
        use InternalOrderState::*;

        let mut table = Self::default();

        let generic: &[(&str, InternalOrderState, bool)] = &[
            ("confirmed", CallCenterConfirmed, false),
            ("processing", OperationsProcessing, false),
            ("picked up", Shipped, false),
            ("picked_up", Shipped, false),
            ("pickup", Shipped, false),
            ("collected", Shipped, false),
            ("shipped", Shipped, false),
            ("dispatched", Shipped, false),
            ("in transit", InTransit, false),
            ("in_transit", InTransit, false),
            ("on the way", InTransit, false),
            ("arrived at facility", InTransit, false),
            ("departed facility", InTransit, false),
            ("out for delivery", OutForDelivery, false),
            ("out_for_delivery", OutForDelivery, false),
            ("with courier", OutForDelivery, false),
            ("delivered", Delivered, true),
            ("delivery confirmed", Delivered, true),
            ("proof of delivery", Delivered, true),
            ("failed delivery", ReturnRequested, false),
            ("delivery failed", ReturnRequested, false),
            ("delivery attempt failed", ReturnRequested, false),
            ("undelivered", ReturnRequested, false),
            ("return", ReturnRequested, false),
            ("returned", ReturnRequested, false),
            ("return initiated", ReturnRequested, false),
            ("return to origin", ReturnRequested, false),
            ("rto", ReturnRequested, false),
            ("return in transit", ReturnInTransit, false),
            ("returned to shipper", ReturnReceived, true),
            ("return received", ReturnReceived, true),
            ("cancelled", Cancelled, true),
            ("canceled", Cancelled, true),
        ];
        for &(status, state, terminal) in generic {
            table.insert_generic(status, state, None, terminal);
        }

        let carrier_specific: &[(&str, &str, InternalOrderState, bool)] = &[
            // Aramex short codes
            ("aramex", "del", Delivered, true),
            ("aramex", "out", OutForDelivery, false),
            ("aramex", "rtn", ReturnInTransit, false),
            ("aramex", "sch", InTransit, false),
            // DHL checkpoint codes
            ("dhl", "ok", Delivered, true),
            ("dhl", "wc", OutForDelivery, false),
            ("dhl", "pu", Shipped, false),
            ("dhl", "rt", ReturnRequested, false),
            // FedEx scan codes
            ("fedex", "dl", Delivered, true),
            ("fedex", "od", OutForDelivery, false),
            ("fedex", "it", InTransit, false),
            ("fedex", "pu", Shipped, false),
        ];
        for &(carrier, status, state, terminal) in carrier_specific {
            table.insert_carrier(carrier, status, state, None, terminal);
        }

        table
    }

    /// Built-in table extended with configuration-supplied entries.
    /// Config entries overwrite built-in rows for the same key.
    pub fn from_config(entries: &[DefaultMappingEntry]) -> Self {
        let mut table = Self::builtin();
        for entry in entries {
            let Ok(state) = entry.internal_state.parse::<InternalOrderState>() else {
                tracing::warn!(
                    internal_state = %entry.internal_state,
                    provider_status = %entry.provider_status,
                    "Skipping default mapping entry with unknown internal state"
                );
                continue;
            };
            let station = entry
                .triggers_station
                .as_deref()
                .and_then(|s| s.parse::<StationType>().ok());

            match entry.carrier.as_deref() {
                None | Some("*") => {
                    table.insert_generic(&entry.provider_status, state, station, entry.is_terminal)
                }
                Some(carrier) => table.insert_carrier(
                    carrier,
                    &entry.provider_status,
                    state,
                    station,
                    entry.is_terminal,
                ),
            }
        }
        table
    }

    fn insert_generic(
        &mut self,
        status: &str,
        internal_state: InternalOrderState,
        triggers_station: Option<StationType>,
        is_terminal: bool,
    ) {
        self.generic.insert(
            status.trim().to_lowercase(),
            DefaultMapping {
                internal_state,
                triggers_station,
                is_terminal,
            },
        );
    }

    fn insert_carrier(
        &mut self,
        carrier: &str,
        status: &str,
        internal_state: InternalOrderState,
        triggers_station: Option<StationType>,
        is_terminal: bool,
    ) {
        self.carrier_exact.insert(
            (carrier.trim().to_lowercase(), status.trim().to_lowercase()),
            DefaultMapping {
                internal_state,
                triggers_station,
                is_terminal,
            },
        );
    }

    /// Case-insensitive lookup: carrier-exact first, then generic
    pub fn resolve(&self, carrier: &str, raw_status: &str) -> Option<&DefaultMapping> {
        let carrier_key = carrier.trim().to_lowercase();
        let status_key = raw_status.trim().to_lowercase();
        self.carrier_exact
            .get(&(carrier_key, status_key.clone()))
            .or_else(|| self.generic.get(&status_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_lookup_is_case_insensitive() {
        let table = DefaultMappingTable::builtin();
        for raw in ["Delivered", "delivered", "DELIVERED", "  delivered "] {
            let mapping = table.resolve("unknown_carrier", raw).unwrap();
            assert_eq!(mapping.internal_state, InternalOrderState::Delivered);
            assert!(mapping.is_terminal);
        }
    }

    #[test]
    fn test_carrier_quirk_beats_generic() {
        let table = DefaultMappingTable::builtin();
        // "DEL" means nothing generically but is Aramex's delivered code
        let mapping = table.resolve("Aramex", "DEL").unwrap();
        assert_eq!(mapping.internal_state, InternalOrderState::Delivered);
        assert!(table.resolve("smsa", "DEL").is_none());
    }

    #[test]
    fn test_unmapped_status_resolves_to_none() {
        let table = DefaultMappingTable::builtin();
        assert!(table.resolve("aramex", "some nonsense scan").is_none());
    }

    #[test]
    fn test_config_entries_extend_and_override() {
        let entries = vec![
            DefaultMappingEntry {
                carrier: Some("smsa".to_string()),
                provider_status: "DLV".to_string(),
                internal_state: "delivered".to_string(),
                triggers_station: None,
                is_terminal: true,
            },
            DefaultMappingEntry {
                carrier: None,
                provider_status: "delivered".to_string(),
                internal_state: "finance_pending".to_string(),
                triggers_station: Some("finance".to_string()),
                is_terminal: false,
            },
        ];
        let table = DefaultMappingTable::from_config(&entries);

        let smsa = table.resolve("smsa", "dlv").unwrap();
        assert_eq!(smsa.internal_state, InternalOrderState::Delivered);

        // Config replaces the built-in generic "delivered" row
        let generic = table.resolve("anything", "delivered").unwrap();
        assert_eq!(generic.internal_state, InternalOrderState::FinancePending);
        assert_eq!(generic.triggers_station, Some(StationType::Finance));
    }

    #[test]
    fn test_config_entry_with_bad_state_is_skipped() {
        let entries = vec![DefaultMappingEntry {
            carrier: None,
            provider_status: "weird".to_string(),
            internal_state: "no_such_state".to_string(),
            triggers_station: None,
            is_terminal: false,
        }];
        let table = DefaultMappingTable::from_config(&entries);
        assert!(table.resolve("any", "weird").is_none());
    }
}
