//! # Billing Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STYLEFLOW_DB_PATH=/var/lib/styleflow/styleflow.db                  │
//! │     STYLEFLOW_REDIS_URL=redis://127.0.0.1:6379                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/styleflow-retail/billing.toml (Linux)                    │
//! │     ~/Library/Application Support/com.styleflow.retail/billing.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/styleflow/styleflow.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [sequences]
//! max_cas_attempts = 5
//!
//! [[sequences.legacy_sources]]
//! table = "invoices"
//! column = "code"
//! prefixes = ["INV", "QUO", "ADV"]
//!
//! [cache]
//! redis_url = "redis://127.0.0.1:6379"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use styleflow_db::{DbConfig, SequenceSettings};

// =============================================================================
// Database Settings
// =============================================================================

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an allocation waits for the write lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "styleflow", "retail")
        .map(|dirs| dirs.data_dir().join("styleflow.db"))
        .unwrap_or_else(|| PathBuf::from("./styleflow.db"))
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Cache & Logging Settings
// =============================================================================

/// Optional Redis cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// `redis://` or `rediss://` URL. Unset disables cache invalidation.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Main Billing Configuration
// =============================================================================

/// Complete billing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Allocator settings, including legacy reconciliation sources.
    #[serde(default)]
    pub sequences: SequenceSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl BillingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (billing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading billing config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(ref url) = self.cache.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::Invalid(format!(
                    "cache.redis_url must start with redis:// or rediss://, got: {}",
                    url
                )));
            }
        }

        self.sequences
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("sequences: {}", e)))?;

        Ok(())
    }

    /// Applies `STYLEFLOW_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("STYLEFLOW_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("STYLEFLOW_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid STYLEFLOW_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(ms) = var("STYLEFLOW_DB_BUSY_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(n) => self.database.busy_timeout_ms = n,
                Err(_) => warn!(value = %ms, "Ignoring invalid STYLEFLOW_DB_BUSY_TIMEOUT_MS"),
            }
        }

        if let Some(attempts) = var("STYLEFLOW_MAX_CAS_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.sequences.max_cas_attempts = n,
                Err(_) => warn!(value = %attempts, "Ignoring invalid STYLEFLOW_MAX_CAS_ATTEMPTS"),
            }
        }

        if let Some(url) = var("STYLEFLOW_REDIS_URL") {
            // Empty value switches the cache off
            self.cache.redis_url = Some(url).filter(|u| !u.is_empty());
        }

        if let Some(level) = var("STYLEFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "styleflow", "retail")
            .map(|dirs| dirs.config_dir().join("billing.toml"))
    }

    /// Database pool configuration derived from these settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use styleflow_db::LegacyCodeSource;

    #[test]
    fn test_default_config() {
        let config = BillingConfig::default();
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.sequences, SequenceSettings::default());
        assert!(config.cache.redis_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.toml");
        std::fs::write(
            &path,
            r#"
            [database]
            path = "/tmp/styleflow-test.db"
            busy_timeout_ms = 250

            [sequences]
            max_cas_attempts = 3

            [[sequences.legacy_sources]]
            table = "expenses"
            column = "code"
            prefixes = ["EXP"]
            "#,
        )
        .unwrap();

        let config = BillingConfig::load(Some(path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/styleflow-test.db"));
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.sequences.max_cas_attempts, 3);
        assert_eq!(
            config.sequences.legacy_sources,
            vec![LegacyCodeSource {
                table: "expenses".into(),
                column: "code".into(),
                prefixes: vec!["EXP".into()],
            }]
        );

        let db = config.db_config();
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BillingConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.sequences.max_cas_attempts, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STYLEFLOW_DB_PATH", "/data/shop.db"),
            ("STYLEFLOW_DB_MAX_CONNECTIONS", "not-a-number"),
            ("STYLEFLOW_MAX_CAS_ATTEMPTS", "9"),
            ("STYLEFLOW_REDIS_URL", "redis://cache:6379"),
            ("STYLEFLOW_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = BillingConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/shop.db"));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.sequences.max_cas_attempts, 9);
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_validation() {
        let mut config = BillingConfig::default();

        config.cache.redis_url = Some("http://cache:6379".into());
        assert!(config.validate().is_err());
        config.cache.redis_url = Some("redis://cache:6379".into());
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 4;

        config.sequences.legacy_sources[0].column = "code; --".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.toml");
        std::fs::write(&path, "[database\npath = 1").unwrap();

        assert!(matches!(
            BillingConfig::load(Some(path)),
            Err(ConfigError::Parse(_))
        ));
    }
}
