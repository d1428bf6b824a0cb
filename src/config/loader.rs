//! Configuration Loader
//!
//! Environment-aware configuration loading: a base YAML file plus an
//! optional per-environment override file, merged before deserialization.

use super::error::{ConfigResult, ConfigurationError};
use super::FulfillmentConfig;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const BASE_CONFIG_FILE: &str = "fulfillment-config.yaml";

/// Loaded configuration plus the environment it was resolved for
pub struct ConfigManager {
    config: FulfillmentConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load with an explicit environment. Useful for tests that must not
    /// mutate global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        debug!(
            environment = %environment,
            database_host = %config.database.host,
            pool_size = config.database.pool,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    pub fn config(&self) -> &FulfillmentConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn detect_environment() -> String {
        env::var("FULFILLMENT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        PathBuf::from("config")
    }

    /// Read the base file and merge `environments/{env}.yaml` over it when
    /// present. A missing base file yields built-in defaults so tests and
    /// tooling work without a config tree on disk.
    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<FulfillmentConfig> {
        let base_path = config_directory.join(BASE_CONFIG_FILE);
        if !base_path.exists() {
            debug!(
                "No configuration file at {}; using built-in defaults",
                base_path.display()
            );
            return Ok(FulfillmentConfig::default());
        }

        let mut merged = Self::read_yaml(&base_path)?;

        let env_path = config_directory
            .join("environments")
            .join(format!("{environment}.yaml"));
        if env_path.exists() {
            let overlay = Self::read_yaml(&env_path)?;
            Self::merge_yaml(&mut merged, overlay);
        }

        let config: FulfillmentConfig = serde_yaml::from_value(merged)?;
        Ok(config)
    }

    fn read_yaml(path: &Path) -> ConfigResult<YamlValue> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Deep-merge mappings; any non-mapping overlay value replaces the base
    fn merge_yaml(base: &mut YamlValue, overlay: YamlValue) {
        match (base, overlay) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(overlay_map)) => {
                for (key, overlay_value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(base_value) => Self::merge_yaml(base_value, overlay_value),
                        None => {
                            base_map.insert(key, overlay_value);
                        }
                    }
                }
            }
            (base_slot, overlay_value) => *base_slot = overlay_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.config().database.pool, 10);
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_overlay_merges_over_base() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            BASE_CONFIG_FILE,
            "database:\n  host: db.internal\n  port: 5432\n  username: app\n  password: secret\n  database: fulfillment\n  pool: 25\nslas:\n  call_center_minutes: 60\n  operations_minutes: 240\n  finance_minutes: 1440\n  returns_minutes: 2880\n",
        );
        write_config(
            dir.path(),
            "environments/test.yaml",
            "database:\n  pool: 2\n",
        );

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        // Overlay wins for pool, base survives for host
        assert_eq!(manager.config().database.pool, 2);
        assert_eq!(manager.config().database.host, "db.internal");
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            BASE_CONFIG_FILE,
            "database:\n  host: localhost\n  port: 5432\n  username: app\n  password: x\n  database: f\n  pool: 0\n",
        );
        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(result.is_err());
    }
}
