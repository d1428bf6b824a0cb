//! # Courier Performance & Smart Routing
//!
//! Daily rollup computation over shipment history plus the weighted
//! per-shipment carrier ranking that reuses the same aggregates.

pub mod engine;
pub mod scoring;
pub mod smart_routing;

pub use engine::{
    aggregate_shipments, CourierPerformanceEngine, CourierRecommendation, PerformanceRunOutcome,
};
pub use scoring::{compute_score, recommendations, CourierMetrics};
pub use smart_routing::{
    rank_carriers, PaymentMethod, RankedCarrier, RoutingRecommendation, RoutingRequest,
    ScoreBreakdown, SmartRoutingScorer,
};
