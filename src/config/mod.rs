//! # Configuration System
//!
//! YAML-based configuration with environment-specific overrides. Default SLA
//! targets, scoring parameters, and the built-in status mapping table are
//! all resolved here at startup — workflow bodies never reach for hardcoded
//! lookups.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fulfillment_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let pool_size = manager.config().database.pool;
//! let window = manager.config().scoring.window_days;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::system;
use crate::state_machine::StationType;

/// Root configuration structure mirroring fulfillment-config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentConfig {
    /// Database connection and pooling configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Per-station SLA targets in minutes (tenant overrides layer on top)
    #[serde(default)]
    pub slas: SlaConfig,

    /// Courier performance scoring parameters
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Ingestion batch limits
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Extra default status mappings merged over the built-in table
    #[serde(default)]
    pub default_status_mappings: Vec<DefaultMappingEntry>,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            slas: SlaConfig::default(),
            scoring: ScoringConfig::default(),
            ingestion: IngestionConfig::default(),
            default_status_mappings: Vec::new(),
        }
    }
}

impl FulfillmentConfig {
    /// Validate the loaded configuration; no silent fallbacks
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.pool == 0 {
            return Err(ConfigurationError::Validation(
                "database.pool must be greater than zero".to_string(),
            ));
        }
        let targets = [
            self.slas.call_center_minutes,
            self.slas.operations_minutes,
            self.slas.finance_minutes,
            self.slas.returns_minutes,
        ];
        if targets.iter().any(|&t| t <= 0) {
            return Err(ConfigurationError::Validation(
                "slas targets must all be positive minutes".to_string(),
            ));
        }
        if self.scoring.window_days <= 0 {
            return Err(ConfigurationError::Validation(
                "scoring.window_days must be positive".to_string(),
            ));
        }
        if self.scoring.on_time_threshold_hours <= 0.0 {
            return Err(ConfigurationError::Validation(
                "scoring.on_time_threshold_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "fulfillment".to_string(),
            password: "fulfillment".to_string(),
            database: "fulfillment_development".to_string(),
            pool: 10,
        }
    }
}

impl DatabaseConfig {
    /// Connection URL; the DATABASE_URL environment variable wins when set
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            )
        })
    }
}

/// Default SLA targets per station, in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    pub call_center_minutes: i32,
    pub operations_minutes: i32,
    pub finance_minutes: i32,
    pub returns_minutes: i32,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            call_center_minutes: system::SLA_CALL_CENTER_MINUTES,
            operations_minutes: system::SLA_OPERATIONS_MINUTES,
            finance_minutes: system::SLA_FINANCE_MINUTES,
            returns_minutes: system::SLA_RETURNS_MINUTES,
        }
    }
}

impl SlaConfig {
    pub fn target_for(&self, station: StationType) -> i32 {
        match station {
            StationType::CallCenter => self.call_center_minutes,
            StationType::Operations => self.operations_minutes,
            StationType::Finance => self.finance_minutes,
            StationType::Returns => self.returns_minutes,
        }
    }

    pub fn as_map(&self) -> HashMap<StationType, i32> {
        StationType::ALL
            .iter()
            .map(|&s| (s, self.target_for(s)))
            .collect()
    }
}

/// Courier performance scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Trailing aggregation window in days
    pub window_days: i64,
    /// Deliveries within this many hours of creation count as on-time
    pub on_time_threshold_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_days: system::PERFORMANCE_WINDOW_DAYS,
            on_time_threshold_hours: system::ON_TIME_THRESHOLD_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum events accepted in one structured batch
    pub max_batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
        }
    }
}

/// One default status mapping entry contributed by configuration.
/// `carrier` of `None` (or `*`) applies to any carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultMappingEntry {
    pub carrier: Option<String>,
    pub provider_status: String,
    pub internal_state: String,
    #[serde(default)]
    pub triggers_station: Option<String>,
    #[serde(default)]
    pub is_terminal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FulfillmentConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_pool() {
        let mut config = FulfillmentConfig::default();
        config.database.pool = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nonpositive_sla() {
        let mut config = FulfillmentConfig::default();
        config.slas.operations_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sla_config_map_covers_every_station() {
        let slas = SlaConfig::default();
        let map = slas.as_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&StationType::Returns], 2880);
    }
}
