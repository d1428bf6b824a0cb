//! # Smart Routing Scorer
//!
//! Ranks carriers for a specific upcoming shipment by reusing the
//! per-carrier performance aggregates with tenant-configurable weights.
//! Administrator-disabled carriers are filtered out and a single
//! forced-carrier override, when set, short-circuits the ranking.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::constants::system;
use crate::models::insights::{courier_performance_window, CourierWindowSummary};
use crate::models::{CarrierSetting, RoutingWeights, TenantRoutingProfile};
use crate::workflows::WorkflowError;

/// Normalization ceilings for the speed components: deliveries slower than
/// five days or pickups slower than two days score zero on their component.
const DELIVERY_HOURS_CEILING: f64 = 120.0;
const PICKUP_HOURS_CEILING: f64 = 48.0;

/// The pending shipment being routed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRequest {
    pub payment_method: PaymentMethod,
    pub order_value: f64,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Prepaid,
    CashOnDelivery,
}

/// Per-component contribution behind a carrier's confidence value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub delivery_speed: f64,
    pub success_rate: f64,
    pub return_rate: f64,
    pub pickup_speed: f64,
    pub cod_performance: f64,
    pub region_coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCarrier {
    pub carrier_code: String,
    /// Weighted confidence on a 0-100 scale
    pub confidence: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRecommendation {
    pub carriers: Vec<RankedCarrier>,
    /// Set when a forced-carrier override decided the outcome
    pub forced: bool,
}

pub struct SmartRoutingScorer {
    pool: PgPool,
}

impl SmartRoutingScorer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rank carriers for a pending shipment
    pub async fn recommend(
        &self,
        tenant_id: Uuid,
        request: &RoutingRequest,
    ) -> Result<RoutingRecommendation, WorkflowError> {
        let profile = TenantRoutingProfile::find_by_tenant(&self.pool, tenant_id).await?;
        let weights = profile
            .as_ref()
            .map(|p| p.weights())
            .unwrap_or_default();
        let disabled: HashSet<String> = CarrierSetting::disabled_carriers(&self.pool, tenant_id)
            .await?
            .into_iter()
            .collect();

        let summaries = courier_performance_window(
            &self.pool,
            tenant_id,
            system::PERFORMANCE_WINDOW_DAYS,
            None,
            None,
        )
        .await?;

        if let Some(forced) = profile.as_ref().and_then(|p| p.forced_carrier.clone()) {
            if !disabled.contains(&forced) {
                let mut ranked = rank_carriers(&summaries, &weights, request, &disabled);
                ranked.retain(|c| c.carrier_code == forced);
                let carrier = ranked.into_iter().next().unwrap_or(RankedCarrier {
                    carrier_code: forced,
                    confidence: 50.0,
                    breakdown: ScoreBreakdown {
                        delivery_speed: 0.0,
                        success_rate: 0.0,
                        return_rate: 0.0,
                        pickup_speed: 0.0,
                        cod_performance: 0.0,
                        region_coverage: 0.0,
                    },
                });
                return Ok(RoutingRecommendation {
                    carriers: vec![carrier],
                    forced: true,
                });
            }
            tracing::warn!(
                tenant_id = %tenant_id,
                "Forced carrier is disabled; falling back to weighted ranking"
            );
        }

        Ok(RoutingRecommendation {
            carriers: rank_carriers(&summaries, &weights, request, &disabled),
            forced: false,
        })
    }
}

/// Pure weighted ranking over performance window summaries.
///
/// Each carrier is scored on the region-matching summary when one exists,
/// otherwise on the average across its regions; carriers in `disabled` are
/// excluded entirely.
pub fn rank_carriers(
    summaries: &[CourierWindowSummary],
    weights: &RoutingWeights,
    request: &RoutingRequest,
    disabled: &HashSet<String>,
) -> Vec<RankedCarrier> {
    let couriers: HashSet<&str> = summaries
        .iter()
        .map(|s| s.courier_code.as_str())
        .filter(|c| !disabled.contains(*c))
        .collect();

    let mut ranked: Vec<RankedCarrier> = couriers
        .into_iter()
        .map(|courier| {
            let rows: Vec<&CourierWindowSummary> = summaries
                .iter()
                .filter(|s| s.courier_code == courier)
                .collect();
            let region_rows: Vec<&CourierWindowSummary> = match &request.region {
                Some(region) => rows
                    .iter()
                    .copied()
                    .filter(|s| &s.region == region)
                    .collect(),
                None => Vec::new(),
            };
            let covers_region = !region_rows.is_empty();
            let scored_rows = if covers_region { &region_rows } else { &rows };

            let breakdown = ScoreBreakdown {
                delivery_speed: 1.0
                    - (avg(scored_rows, |s| s.avg_delivery_hours) / DELIVERY_HOURS_CEILING)
                        .clamp(0.0, 1.0),
                success_rate: avg(scored_rows, |s| s.avg_delivery_rate),
                return_rate: 1.0 - avg(scored_rows, |s| s.avg_return_rate).clamp(0.0, 1.0),
                pickup_speed: 1.0
                    - (avg(scored_rows, |s| s.avg_pickup_hours) / PICKUP_HOURS_CEILING)
                        .clamp(0.0, 1.0),
                cod_performance: match request.payment_method {
                    PaymentMethod::CashOnDelivery => {
                        avg(scored_rows, |s| s.avg_cod_collection_rate)
                    }
                    // COD track record is irrelevant for prepaid shipments
                    PaymentMethod::Prepaid => 1.0,
                },
                region_coverage: match &request.region {
                    Some(_) if covers_region => 1.0,
                    Some(_) => 0.5,
                    None => 1.0,
                },
            };

            let confidence = 100.0
                * (weights.delivery_speed * breakdown.delivery_speed
                    + weights.success_rate * breakdown.success_rate
                    + weights.return_rate * breakdown.return_rate
                    + weights.pickup_speed * breakdown.pickup_speed
                    + weights.cod_performance * breakdown.cod_performance
                    + weights.region_coverage * breakdown.region_coverage);

            RankedCarrier {
                carrier_code: courier.to_string(),
                confidence,
                breakdown,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.carrier_code.cmp(&b.carrier_code))
    });
    ranked
}

fn avg<F>(rows: &[&CourierWindowSummary], extract: F) -> f64
where
    F: Fn(&CourierWindowSummary) -> Option<f64>,
{
    let values: Vec<f64> = rows.iter().filter_map(|s| extract(s)).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        courier: &str,
        region: &str,
        delivery_rate: f64,
        return_rate: f64,
        pickup_hours: f64,
        delivery_hours: f64,
    ) -> CourierWindowSummary {
        CourierWindowSummary {
            courier_code: courier.to_string(),
            region: region.to_string(),
            total_shipments: 100,
            delivered_count: (delivery_rate * 100.0) as i64,
            returned_count: (return_rate * 100.0) as i64,
            avg_score: Some(70.0),
            avg_delivery_rate: Some(delivery_rate),
            avg_return_rate: Some(return_rate),
            avg_on_time_rate: Some(0.8),
            avg_cod_collection_rate: Some(0.9),
            avg_pickup_hours: Some(pickup_hours),
            avg_delivery_hours: Some(delivery_hours),
        }
    }

    fn request(region: Option<&str>) -> RoutingRequest {
        RoutingRequest {
            payment_method: PaymentMethod::CashOnDelivery,
            order_value: 250.0,
            region: region.map(String::from),
        }
    }

    #[test]
    fn test_stronger_carrier_ranks_first() {
        let summaries = vec![
            summary("aramex", "riyadh", 0.95, 0.05, 4.0, 24.0),
            summary("slowpost", "riyadh", 0.60, 0.30, 40.0, 110.0),
        ];
        let ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &request(Some("riyadh")),
            &HashSet::new(),
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].carrier_code, "aramex");
        assert!(ranked[0].confidence > ranked[1].confidence);
    }

    #[test]
    fn test_disabled_carrier_is_filtered() {
        let summaries = vec![
            summary("aramex", "riyadh", 0.95, 0.05, 4.0, 24.0),
            summary("dhl", "riyadh", 0.90, 0.08, 6.0, 30.0),
        ];
        let disabled: HashSet<String> = ["aramex".to_string()].into();
        let ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &request(Some("riyadh")),
            &disabled,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].carrier_code, "dhl");
    }

    #[test]
    fn test_region_coverage_penalty() {
        let summaries = vec![
            summary("local", "riyadh", 0.85, 0.10, 8.0, 36.0),
            summary("elsewhere", "jeddah", 0.85, 0.10, 8.0, 36.0),
        ];
        let ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &request(Some("riyadh")),
            &HashSet::new(),
        );
        let local = ranked.iter().find(|c| c.carrier_code == "local").unwrap();
        let other = ranked
            .iter()
            .find(|c| c.carrier_code == "elsewhere")
            .unwrap();
        assert_eq!(local.breakdown.region_coverage, 1.0);
        assert_eq!(other.breakdown.region_coverage, 0.5);
        assert!(local.confidence > other.confidence);
    }

    #[test]
    fn test_prepaid_ignores_cod_track_record() {
        let mut poor_cod = summary("codlaggard", "riyadh", 0.9, 0.05, 5.0, 30.0);
        poor_cod.avg_cod_collection_rate = Some(0.2);
        let summaries = vec![poor_cod];

        let cod_request = request(Some("riyadh"));
        let prepaid_request = RoutingRequest {
            payment_method: PaymentMethod::Prepaid,
            ..cod_request.clone()
        };

        let cod_ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &cod_request,
            &HashSet::new(),
        );
        let prepaid_ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &prepaid_request,
            &HashSet::new(),
        );
        assert!(prepaid_ranked[0].confidence > cod_ranked[0].confidence);
        assert_eq!(prepaid_ranked[0].breakdown.cod_performance, 1.0);
    }

    #[test]
    fn test_custom_weights_change_ordering() {
        // fastpick: instant pickups, mediocre success. reliable: slower
        // pickups, high success.
        let summaries = vec![
            summary("fastpick", "riyadh", 0.70, 0.10, 1.0, 40.0),
            summary("reliable", "riyadh", 0.97, 0.03, 30.0, 40.0),
        ];

        let default_ranked = rank_carriers(
            &summaries,
            &RoutingWeights::default(),
            &request(Some("riyadh")),
            &HashSet::new(),
        );
        assert_eq!(default_ranked[0].carrier_code, "reliable");

        let pickup_obsessed = RoutingWeights {
            delivery_speed: 0.05,
            success_rate: 0.05,
            return_rate: 0.05,
            pickup_speed: 0.80,
            cod_performance: 0.025,
            region_coverage: 0.025,
        };
        let ranked = rank_carriers(
            &summaries,
            &pickup_obsessed,
            &request(Some("riyadh")),
            &HashSet::new(),
        );
        assert_eq!(ranked[0].carrier_code, "fastpick");
    }
}
