//! # Tenant Routing Profile Model
//!
//! One row per tenant holding the smart-routing weight overrides, per-station
//! SLA overrides, and the optional single forced-carrier override. Typed
//! accessors layer tenant JSONB values over built-in defaults.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::state_machine::StationType;

/// Weights applied by the smart routing scorer. Fractions over the scoring
/// components; tenants may override any subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingWeights {
    #[serde(default = "default_delivery_speed")]
    pub delivery_speed: f64,
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    #[serde(default = "default_return_rate")]
    pub return_rate: f64,
    #[serde(default = "default_pickup_speed")]
    pub pickup_speed: f64,
    #[serde(default = "default_cod_performance")]
    pub cod_performance: f64,
    #[serde(default = "default_region_coverage")]
    pub region_coverage: f64,
}

fn default_delivery_speed() -> f64 {
    0.25
}
fn default_success_rate() -> f64 {
    0.30
}
fn default_return_rate() -> f64 {
    0.15
}
fn default_pickup_speed() -> f64 {
    0.15
}
fn default_cod_performance() -> f64 {
    0.10
}
fn default_region_coverage() -> f64 {
    0.05
}

impl Default for RoutingWeights {
    fn default() -> Self {
        Self {
            delivery_speed: default_delivery_speed(),
            success_rate: default_success_rate(),
            return_rate: default_return_rate(),
            pickup_speed: default_pickup_speed(),
            cod_performance: default_cod_performance(),
            region_coverage: default_region_coverage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantRoutingProfile {
    pub profile_id: i64,
    pub tenant_id: Uuid,
    pub routing_weights: Option<serde_json::Value>,
    pub sla_overrides: Option<serde_json::Value>,
    pub forced_carrier: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TenantRoutingProfile {
    pub async fn find_by_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Option<TenantRoutingProfile>, sqlx::Error> {
        sqlx::query_as::<_, TenantRoutingProfile>(
            "SELECT * FROM fulfillment_tenant_routing_profiles WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(
        pool: &PgPool,
        tenant_id: Uuid,
        routing_weights: Option<serde_json::Value>,
        sla_overrides: Option<serde_json::Value>,
        forced_carrier: Option<String>,
    ) -> Result<TenantRoutingProfile, sqlx::Error> {
        sqlx::query_as::<_, TenantRoutingProfile>(
            r#"
            INSERT INTO fulfillment_tenant_routing_profiles
            (tenant_id, routing_weights, sla_overrides, forced_carrier, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                routing_weights = EXCLUDED.routing_weights,
                sla_overrides = EXCLUDED.sla_overrides,
                forced_carrier = EXCLUDED.forced_carrier,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(routing_weights)
        .bind(sla_overrides)
        .bind(forced_carrier)
        .fetch_one(pool)
        .await
    }

    /// Tenant routing weights layered over defaults. Unknown or malformed
    /// override payloads fall back to the defaults rather than failing the
    /// scorer.
    pub fn weights(&self) -> RoutingWeights {
        self.routing_weights
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// The tenant's SLA override for a station, when one is configured
    pub fn sla_override_for(&self, station: StationType) -> Option<i32> {
        self.sla_overrides
            .as_ref()
            .and_then(|v| serde_json::from_value::<HashMap<String, i32>>(v.clone()).ok())
            .and_then(|m| m.get(&station.to_string()).copied())
    }

    /// SLA target for a station: tenant override when present, else the
    /// built-in default.
    pub fn sla_target_minutes(&self, station: StationType) -> i32 {
        self.sla_override_for(station)
            .unwrap_or_else(|| station.default_sla_minutes())
    }
}

/// Resolve the SLA target for a station when a tenant may not have a profile
pub fn sla_target_for(profile: Option<&TenantRoutingProfile>, station: StationType) -> i32 {
    profile
        .map(|p| p.sla_target_minutes(station))
        .unwrap_or_else(|| station.default_sla_minutes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn profile_with(
        weights: Option<serde_json::Value>,
        slas: Option<serde_json::Value>,
    ) -> TenantRoutingProfile {
        TenantRoutingProfile {
            profile_id: 1,
            tenant_id: Uuid::new_v4(),
            routing_weights: weights,
            sla_overrides: slas,
            forced_carrier: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_default_weights() {
        let w = RoutingWeights::default();
        assert_eq!(w.delivery_speed, 0.25);
        assert_eq!(w.success_rate, 0.30);
        assert_eq!(w.return_rate, 0.15);
        assert_eq!(w.pickup_speed, 0.15);
        assert_eq!(w.cod_performance, 0.10);
        assert_eq!(w.region_coverage, 0.05);
        let total = w.delivery_speed
            + w.success_rate
            + w.return_rate
            + w.pickup_speed
            + w.cod_performance
            + w.region_coverage;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_weight_override_keeps_defaults() {
        let profile = profile_with(Some(json!({"success_rate": 0.5})), None);
        let w = profile.weights();
        assert_eq!(w.success_rate, 0.5);
        assert_eq!(w.delivery_speed, 0.25);
    }

    #[test]
    fn test_malformed_weights_fall_back() {
        let profile = profile_with(Some(json!("not an object")), None);
        assert_eq!(profile.weights(), RoutingWeights::default());
    }

    #[test]
    fn test_sla_override_layering() {
        let profile = profile_with(None, Some(json!({"operations": 90})));
        assert_eq!(profile.sla_target_minutes(StationType::Operations), 90);
        assert_eq!(profile.sla_target_minutes(StationType::Finance), 1440);
    }

    #[test]
    fn test_sla_target_without_profile() {
        assert_eq!(sla_target_for(None, StationType::CallCenter), 60);
        let profile = profile_with(None, Some(json!({"call_center": 30})));
        assert_eq!(sla_target_for(Some(&profile), StationType::CallCenter), 30);
    }
}
