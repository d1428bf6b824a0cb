//! # Configuration Surface
//!
//! Tenant-facing configuration operations: status mapping upserts, carrier
//! enable/disable, routing profile updates, and DLQ resolution. Every
//! state-changing action here is audited, and mapping changes invalidate
//! the normalizer's tenant rule cache.

use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::errors::WorkflowError;
use crate::models::{
    AuditEntry, CarrierSetting, DeadLetterEntry, NewAuditEntry, NewProviderStatusMapping,
    ProviderStatusMapping, TenantRoutingProfile,
};
use crate::normalizer::StatusNormalizer;

pub struct ConfigurationSurface {
    pool: PgPool,
    normalizer: Arc<StatusNormalizer>,
}

impl ConfigurationSurface {
    pub fn new(pool: PgPool, normalizer: Arc<StatusNormalizer>) -> Self {
        Self { pool, normalizer }
    }

    /// Upsert a tenant status mapping rule. The normalizer cache for the
    /// tenant is dropped so the next normalization observes the new rule.
    pub async fn upsert_status_mapping(
        &self,
        mapping: NewProviderStatusMapping,
        actor: &str,
    ) -> Result<ProviderStatusMapping, WorkflowError> {
        let tenant_id = mapping.tenant_id;
        let after = json!({
            "carrier_code": mapping.carrier_code,
            "provider_status": mapping.provider_status,
            "internal_state": mapping.internal_state.to_string(),
            "is_terminal": mapping.is_terminal,
        });

        let row = ProviderStatusMapping::upsert(&self.pool, mapping).await?;
        self.normalizer.invalidate_tenant(tenant_id);

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "provider_status_mapping".to_string(),
                entity_id: row.mapping_id.to_string(),
                action: "mapping.upserted".to_string(),
                before_state: None,
                after_state: Some(after),
                actor: actor.to_string(),
            },
        )
        .await?;

        Ok(row)
    }

    /// Enable or disable a carrier for a tenant
    pub async fn set_carrier_enabled(
        &self,
        tenant_id: Uuid,
        carrier_code: &str,
        enabled: bool,
        actor: &str,
    ) -> Result<CarrierSetting, WorkflowError> {
        let setting = CarrierSetting::set_enabled(&self.pool, tenant_id, carrier_code, enabled).await?;

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "carrier_setting".to_string(),
                entity_id: carrier_code.to_string(),
                action: "carrier.toggled".to_string(),
                before_state: Some(json!({ "enabled": !enabled })),
                after_state: Some(json!({ "enabled": enabled })),
                actor: actor.to_string(),
            },
        )
        .await?;

        Ok(setting)
    }

    /// Replace the tenant's routing weights, SLA overrides, and forced
    /// carrier in one write
    pub async fn upsert_routing_profile(
        &self,
        tenant_id: Uuid,
        routing_weights: Option<serde_json::Value>,
        sla_overrides: Option<serde_json::Value>,
        forced_carrier: Option<String>,
        actor: &str,
    ) -> Result<TenantRoutingProfile, WorkflowError> {
        let before = TenantRoutingProfile::find_by_tenant(&self.pool, tenant_id)
            .await?
            .map(|p| {
                json!({
                    "routing_weights": p.routing_weights,
                    "sla_overrides": p.sla_overrides,
                    "forced_carrier": p.forced_carrier,
                })
            });

        let profile = TenantRoutingProfile::upsert(
            &self.pool,
            tenant_id,
            routing_weights,
            sla_overrides,
            forced_carrier,
        )
        .await?;

        AuditEntry::create(
            &self.pool,
            NewAuditEntry {
                tenant_id,
                entity_type: "tenant_routing_profile".to_string(),
                entity_id: tenant_id.to_string(),
                action: "routing_profile.upserted".to_string(),
                before_state: before,
                after_state: Some(json!({
                    "routing_weights": profile.routing_weights,
                    "sla_overrides": profile.sla_overrides,
                    "forced_carrier": profile.forced_carrier,
                })),
                actor: actor.to_string(),
            },
        )
        .await?;

        Ok(profile)
    }

    /// Operator resolution of a dead-letter entry
    pub async fn resolve_dead_letter(
        &self,
        entry_id: i64,
        actor: &str,
    ) -> Result<DeadLetterEntry, WorkflowError> {
        let Some(entry) = DeadLetterEntry::resolve(&self.pool, entry_id).await? else {
            return Err(WorkflowError::NotFound(format!(
                "open dead letter entry {entry_id}"
            )));
        };

        if let Some(tenant_id) = entry.tenant_id {
            AuditEntry::create(
                &self.pool,
                NewAuditEntry {
                    tenant_id,
                    entity_type: "dead_letter_entry".to_string(),
                    entity_id: entry.entry_id.to_string(),
                    action: "dead_letter.resolved".to_string(),
                    before_state: Some(json!({ "resolved_at": null })),
                    after_state: Some(json!({ "resolved_at": entry.resolved_at })),
                    actor: actor.to_string(),
                },
            )
            .await?;
        }

        Ok(entry)
    }
}
