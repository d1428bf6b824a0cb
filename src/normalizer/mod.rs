//! # Status Normalizer
//!
//! Maps a carrier-specific raw status string to an internal order state.
//!
//! ## Lookup order
//!
//! 1. Tenant-specific exact mapping for `(carrier, raw_status)` — rules are
//!    authoritative and matched case-sensitively.
//! 2. Tenant-specific wildcard-carrier mapping — also case-sensitive.
//! 3. Built-in default table — case-insensitive, carrier-exact entries
//!    before the generic lifecycle vocabulary.
//! 4. Unmapped — the caller stores the raw event with a null internal
//!    status and attempts no transition; the event is never dropped.

pub mod defaults;

use dashmap::DashMap;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::core::provider_status_mapping::WILDCARD_CARRIER;
use crate::models::ProviderStatusMapping;
use crate::state_machine::{InternalOrderState, StationType};

pub use defaults::{DefaultMapping, DefaultMappingTable};

/// The normalizer's verdict for one raw status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedStatus {
    pub internal_state: InternalOrderState,
    pub triggers_station: Option<StationType>,
    pub is_terminal: bool,
}

/// Tenant-aware status normalizer with a per-tenant rule cache
pub struct StatusNormalizer {
    pool: PgPool,
    defaults: Arc<DefaultMappingTable>,
    tenant_rules: DashMap<Uuid, Arc<Vec<ProviderStatusMapping>>>,
}

impl StatusNormalizer {
    pub fn new(pool: PgPool, defaults: Arc<DefaultMappingTable>) -> Self {
        Self {
            pool,
            defaults,
            tenant_rules: DashMap::new(),
        }
    }

    /// Normalize one raw provider status for a tenant. `Ok(None)` means
    /// unmapped.
    pub async fn normalize(
        &self,
        tenant_id: Uuid,
        carrier: &str,
        raw_status: &str,
    ) -> Result<Option<NormalizedStatus>, sqlx::Error> {
        let rules = self.tenant_rules_for(tenant_id).await?;

        if let Some(normalized) = resolve_tenant_rules(&rules, carrier, raw_status) {
            return Ok(Some(normalized));
        }

        Ok(self
            .defaults
            .resolve(carrier, raw_status)
            .map(|d| NormalizedStatus {
                internal_state: d.internal_state,
                triggers_station: d.triggers_station,
                is_terminal: d.is_terminal,
            }))
    }

    /// Drop the cached rules for a tenant. Called after a mapping upsert so
    /// the next normalization observes the new rule.
    pub fn invalidate_tenant(&self, tenant_id: Uuid) {
        self.tenant_rules.remove(&tenant_id);
    }

    async fn tenant_rules_for(
        &self,
        tenant_id: Uuid,
    ) -> Result<Arc<Vec<ProviderStatusMapping>>, sqlx::Error> {
        if let Some(cached) = self.tenant_rules.get(&tenant_id) {
            return Ok(Arc::clone(&cached));
        }

        let rules = Arc::new(ProviderStatusMapping::list_for_tenant(&self.pool, tenant_id).await?);
        self.tenant_rules.insert(tenant_id, Arc::clone(&rules));
        Ok(rules)
    }
}

/// Resolve against tenant rules only: carrier-exact rules first, then
/// wildcard-carrier rules, both case-sensitive. Rules whose stored state no
/// longer parses are skipped.
pub fn resolve_tenant_rules(
    rules: &[ProviderStatusMapping],
    carrier: &str,
    raw_status: &str,
) -> Option<NormalizedStatus> {
    let exact = rules
        .iter()
        .find(|r| r.carrier_code == carrier && r.provider_status == raw_status);
    let wildcard = rules
        .iter()
        .find(|r| r.carrier_code == WILDCARD_CARRIER && r.provider_status == raw_status);

    for rule in exact.into_iter().chain(wildcard) {
        let Ok(internal_state) = rule.internal_state.parse::<InternalOrderState>() else {
            tracing::warn!(
                mapping_id = rule.mapping_id,
                internal_state = %rule.internal_state,
                "Skipping tenant mapping with unparseable internal state"
            );
            continue;
        };
        let triggers_station = rule
            .triggers_station
            .as_deref()
            .and_then(|s| s.parse::<StationType>().ok());
        return Some(NormalizedStatus {
            internal_state,
            triggers_station,
            is_terminal: rule.is_terminal,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(
        carrier: &str,
        provider_status: &str,
        internal_state: &str,
        triggers_station: Option<&str>,
    ) -> ProviderStatusMapping {
        ProviderStatusMapping {
            mapping_id: 1,
            tenant_id: Uuid::new_v4(),
            carrier_code: carrier.to_string(),
            provider_status: provider_status.to_string(),
            internal_state: internal_state.to_string(),
            triggers_station: triggers_station.map(String::from),
            is_terminal: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_tenant_exact_beats_wildcard() {
        let rules = vec![
            rule("*", "DEL", "in_transit", None),
            rule("aramex", "DEL", "delivered", Some("finance")),
        ];
        let resolved = resolve_tenant_rules(&rules, "aramex", "DEL").unwrap();
        assert_eq!(resolved.internal_state, InternalOrderState::Delivered);
        assert_eq!(resolved.triggers_station, Some(StationType::Finance));

        let other = resolve_tenant_rules(&rules, "dhl", "DEL").unwrap();
        assert_eq!(other.internal_state, InternalOrderState::InTransit);
    }

    #[test]
    fn test_tenant_rules_are_case_sensitive() {
        let rules = vec![rule("aramex", "DEL", "delivered", None)];
        assert!(resolve_tenant_rules(&rules, "aramex", "del").is_none());
        assert!(resolve_tenant_rules(&rules, "aramex", "DEL").is_some());
    }

    #[test]
    fn test_rule_with_corrupt_state_is_skipped() {
        let rules = vec![
            rule("aramex", "DEL", "not_a_state", None),
            rule("*", "DEL", "delivered", None),
        ];
        // The exact rule is corrupt; resolution falls through to the wildcard
        let resolved = resolve_tenant_rules(&rules, "aramex", "DEL").unwrap();
        assert_eq!(resolved.internal_state, InternalOrderState::Delivered);
    }

    #[test]
    fn test_no_rules_resolves_to_none() {
        assert!(resolve_tenant_rules(&[], "aramex", "DEL").is_none());
    }
}
