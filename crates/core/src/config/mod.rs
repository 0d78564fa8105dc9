//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, highest precedence first:
//!
//! 1. Environment variables (WPSNAPSHOTS_*)
//! 2. TOML config file (if WPSNAPSHOTS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::PathResolver;
use crate::store::TableSpec;

mod environment;
mod validation;

pub use environment::Environment;
pub use validation::ConfigError;

/// File name of the local table database inside the cache root.
pub const TABLE_DB_FILE: &str = "tables.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository whose table and payloads are addressed.
    ///
    /// Set via WPSNAPSHOTS_REPOSITORY.
    #[serde(default)]
    pub repository: Option<String>,

    /// Region of the remote metadata store.
    ///
    /// Set via WPSNAPSHOTS_REGION.
    #[serde(default = "default_region")]
    pub region: String,

    /// Set via WPSNAPSHOTS_ACCESS_KEY_ID.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Set via WPSNAPSHOTS_SECRET_ACCESS_KEY.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Custom endpoint for the metadata store, e.g. a local DynamoDB.
    ///
    /// Set via WPSNAPSHOTS_ENDPOINT_URL.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Snapshot cache root override. Empty means unset.
    ///
    /// Set via WPSNAPSHOTS_DIR.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Path of the SQLite table database (default `<cache root>/tables.sqlite`).
    ///
    /// Set via WPSNAPSHOTS_TABLE_DB_PATH.
    #[serde(default)]
    pub table_db_path: Option<PathBuf>,

    #[serde(default = "default_read_capacity")]
    pub read_capacity: i64,

    #[serde(default = "default_write_capacity")]
    pub write_capacity: i64,

    /// Seconds to wait for a newly created table to become ready.
    #[serde(default = "default_table_ready_timeout_secs")]
    pub table_ready_timeout_secs: u64,
}

fn default_region() -> String {
    "us-west-1".into()
}

fn default_read_capacity() -> i64 {
    10
}

fn default_write_capacity() -> i64 {
    20
}

fn default_table_ready_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            dir: None,
            table_db_path: None,
            read_capacity: default_read_capacity(),
            write_capacity: default_write_capacity(),
            table_ready_timeout_secs: default_table_ready_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration file cannot be read, an
    /// environment variable cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WPSNAPSHOTS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WPSNAPSHOTS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn table_spec(&self) -> TableSpec {
        TableSpec {
            read_capacity: self.read_capacity,
            write_capacity: self.write_capacity,
            ready_timeout: Duration::from_secs(self.table_ready_timeout_secs),
        }
    }

    /// Where the SQLite table backend keeps its file.
    pub fn table_db_path(&self, resolver: &PathResolver) -> PathBuf {
        self.table_db_path
            .clone()
            .unwrap_or_else(|| resolver.cache_root().join(TABLE_DB_FILE))
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no repository is configured.
    pub fn require_repository(&self) -> Result<&str, ConfigError> {
        self.repository.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "repository".into(),
            hint: "Set WPSNAPSHOTS_REPOSITORY or add `repository` to the config file".into(),
        })
    }

    /// Access key id and secret for the remote store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if either half is not set.
    pub fn require_credentials(&self) -> Result<(&str, &str), ConfigError> {
        match (self.access_key_id.as_deref(), self.secret_access_key.as_deref()) {
            (Some(key), Some(secret)) => Ok((key, secret)),
            _ => Err(ConfigError::Missing {
                field: "access_key_id/secret_access_key".into(),
                hint: "Set WPSNAPSHOTS_ACCESS_KEY_ID and WPSNAPSHOTS_SECRET_ACCESS_KEY".into(),
            }),
        }
    }
}
