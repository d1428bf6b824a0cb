use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal order lifecycle states forming the fulfillment state graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalOrderState {
    /// Order has been created but not yet confirmed
    New,
    /// Awaiting call center confirmation
    CallCenterPending,
    /// Confirmed by the call center
    CallCenterConfirmed,
    /// Queued for operations handling
    OperationsPending,
    /// Being prepared/packed by operations
    OperationsProcessing,
    /// Handed to the carrier
    Shipped,
    /// Moving through the carrier network
    InTransit,
    /// With the courier for final delivery
    OutForDelivery,
    /// Delivered to the customer
    Delivered,
    /// Awaiting financial settlement (COD remittance, invoicing)
    FinancePending,
    /// Settlement complete
    FinanceSettled,
    /// Customer or carrier initiated a return
    ReturnRequested,
    /// Return shipment moving back
    ReturnInTransit,
    /// Return received and processed
    ReturnReceived,
    /// Order cancelled
    Cancelled,
}

impl InternalOrderState {
    /// Check if this is a terminal state (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::FinanceSettled | Self::Cancelled | Self::ReturnReceived
        )
    }

    /// Check if the shipment is in carrier custody with no station owner
    pub fn is_in_transit(&self) -> bool {
        matches!(
            self,
            Self::Shipped | Self::InTransit | Self::OutForDelivery | Self::ReturnInTransit
        )
    }

    /// The operational station that owns an order in this state, if any.
    ///
    /// `None` means the order is in transit (or terminal) and no station
    /// owns it.
    pub fn station(&self) -> Option<StationType> {
        match self {
            Self::CallCenterPending | Self::CallCenterConfirmed => Some(StationType::CallCenter),
            Self::OperationsPending | Self::OperationsProcessing => Some(StationType::Operations),
            Self::Delivered | Self::FinancePending => Some(StationType::Finance),
            Self::ReturnRequested | Self::ReturnReceived => Some(StationType::Returns),
            Self::New
            | Self::Shipped
            | Self::InTransit
            | Self::OutForDelivery
            | Self::FinanceSettled
            | Self::ReturnInTransit
            | Self::Cancelled => None,
        }
    }

    /// Whether `to` is a legal edge of the state graph from this state.
    ///
    /// The transition machinery stays permissive (provider mappings are the
    /// source of truth for what actually occurs); out-of-sequence edges are
    /// applied but flagged on the timeline row.
    pub fn can_transition_to(&self, to: InternalOrderState) -> bool {
        use InternalOrderState::*;
        if *self == to {
            return false;
        }
        match self {
            New => matches!(to, CallCenterPending | Cancelled),
            CallCenterPending => matches!(to, CallCenterConfirmed | Cancelled),
            CallCenterConfirmed => matches!(to, OperationsPending | Cancelled),
            OperationsPending => matches!(to, OperationsProcessing | Cancelled),
            OperationsProcessing => matches!(to, Shipped | Cancelled),
            // Carriers frequently skip scan points, so later shipment states
            // are reachable directly from Shipped
            Shipped => matches!(
                to,
                InTransit | OutForDelivery | Delivered | ReturnRequested | Cancelled
            ),
            InTransit => matches!(to, OutForDelivery | Delivered | ReturnRequested),
            OutForDelivery => matches!(to, Delivered | InTransit | ReturnRequested),
            Delivered => matches!(to, FinancePending | ReturnRequested),
            FinancePending => matches!(to, FinanceSettled),
            ReturnRequested => matches!(to, ReturnInTransit | ReturnReceived | Cancelled),
            ReturnInTransit => matches!(to, ReturnReceived),
            FinanceSettled | ReturnReceived | Cancelled => false,
        }
    }
}

impl fmt::Display for InternalOrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::CallCenterPending => "call_center_pending",
            Self::CallCenterConfirmed => "call_center_confirmed",
            Self::OperationsPending => "operations_pending",
            Self::OperationsProcessing => "operations_processing",
            Self::Shipped => "shipped",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::FinancePending => "finance_pending",
            Self::FinanceSettled => "finance_settled",
            Self::ReturnRequested => "return_requested",
            Self::ReturnInTransit => "return_in_transit",
            Self::ReturnReceived => "return_received",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for InternalOrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "call_center_pending" => Ok(Self::CallCenterPending),
            "call_center_confirmed" => Ok(Self::CallCenterConfirmed),
            "operations_pending" => Ok(Self::OperationsPending),
            "operations_processing" => Ok(Self::OperationsProcessing),
            "shipped" => Ok(Self::Shipped),
            "in_transit" => Ok(Self::InTransit),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "finance_pending" => Ok(Self::FinancePending),
            "finance_settled" => Ok(Self::FinanceSettled),
            "return_requested" => Ok(Self::ReturnRequested),
            "return_in_transit" => Ok(Self::ReturnInTransit),
            "return_received" => Ok(Self::ReturnReceived),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid internal order state: {s}")),
        }
    }
}

impl Default for InternalOrderState {
    fn default() -> Self {
        Self::New
    }
}

/// Operational stations that own orders for bounded residency intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationType {
    CallCenter,
    Operations,
    Finance,
    Returns,
}

impl StationType {
    pub const ALL: [StationType; 4] = [
        StationType::CallCenter,
        StationType::Operations,
        StationType::Finance,
        StationType::Returns,
    ];

    /// Built-in SLA target in minutes, before tenant overrides
    pub fn default_sla_minutes(&self) -> i32 {
        match self {
            StationType::CallCenter => crate::constants::system::SLA_CALL_CENTER_MINUTES,
            StationType::Operations => crate::constants::system::SLA_OPERATIONS_MINUTES,
            StationType::Finance => crate::constants::system::SLA_FINANCE_MINUTES,
            StationType::Returns => crate::constants::system::SLA_RETURNS_MINUTES,
        }
    }
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CallCenter => "call_center",
            Self::Operations => "operations",
            Self::Finance => "finance",
            Self::Returns => "returns",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for StationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call_center" => Ok(Self::CallCenter),
            "operations" => Ok(Self::Operations),
            "finance" => Ok(Self::Finance),
            "returns" => Ok(Self::Returns),
            _ => Err(format!("Invalid station type: {s}")),
        }
    }
}

/// Channel through which a shipment event entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    Api,
    Csv,
    Email,
    Manual,
}

impl fmt::Display for IngestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Api => "api",
            Self::Csv => "csv",
            Self::Email => "email",
            Self::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for IngestionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Self::Api),
            "csv" => Ok(Self::Csv),
            "email" => Ok(Self::Email),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Invalid ingestion mode: {s}")),
        }
    }
}

/// Who triggered a recorded transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    System,
    Automation,
    User,
}

impl fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::Automation => "automation",
            Self::User => "user",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(InternalOrderState::FinanceSettled.is_terminal());
        assert!(InternalOrderState::Cancelled.is_terminal());
        assert!(InternalOrderState::ReturnReceived.is_terminal());
        assert!(!InternalOrderState::Delivered.is_terminal());
        assert!(!InternalOrderState::New.is_terminal());
    }

    #[test]
    fn test_station_routing_table() {
        assert_eq!(
            InternalOrderState::CallCenterPending.station(),
            Some(StationType::CallCenter)
        );
        assert_eq!(
            InternalOrderState::OperationsProcessing.station(),
            Some(StationType::Operations)
        );
        // Delivery hands the order to finance for settlement
        assert_eq!(
            InternalOrderState::Delivered.station(),
            Some(StationType::Finance)
        );
        assert_eq!(
            InternalOrderState::ReturnRequested.station(),
            Some(StationType::Returns)
        );
        // In-transit states have no station owner
        assert_eq!(InternalOrderState::InTransit.station(), None);
        assert_eq!(InternalOrderState::Shipped.station(), None);
        assert_eq!(InternalOrderState::Cancelled.station(), None);
    }

    #[test]
    fn test_adjacency_happy_path() {
        use InternalOrderState::*;
        let chain = [
            New,
            CallCenterPending,
            CallCenterConfirmed,
            OperationsPending,
            OperationsProcessing,
            Shipped,
            InTransit,
            OutForDelivery,
            Delivered,
            FinancePending,
            FinanceSettled,
        ];
        for pair in chain.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_adjacency_rejects_backwards_edges() {
        use InternalOrderState::*;
        assert!(!Delivered.can_transition_to(OperationsPending));
        assert!(!FinanceSettled.can_transition_to(New));
        assert!(!Cancelled.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Delivered));
    }

    #[test]
    fn test_carrier_scan_skips_are_legal() {
        use InternalOrderState::*;
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(InTransit));
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(
            InternalOrderState::OutForDelivery.to_string(),
            "out_for_delivery"
        );
        assert_eq!(
            "call_center_confirmed".parse::<InternalOrderState>().unwrap(),
            InternalOrderState::CallCenterConfirmed
        );
        assert_eq!(StationType::CallCenter.to_string(), "call_center");
        assert_eq!(
            "returns".parse::<StationType>().unwrap(),
            StationType::Returns
        );
        assert!("teleported".parse::<InternalOrderState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let state = InternalOrderState::ReturnInTransit;
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"return_in_transit\"");

        let parsed: InternalOrderState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_sla_defaults_per_station() {
        assert_eq!(StationType::CallCenter.default_sla_minutes(), 60);
        assert_eq!(StationType::Operations.default_sla_minutes(), 240);
        assert_eq!(StationType::Finance.default_sla_minutes(), 1440);
        assert_eq!(StationType::Returns.default_sla_minutes(), 2880);
    }
}
