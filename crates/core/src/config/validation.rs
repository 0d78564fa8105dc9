//! Configuration validation rules.

use crate::config::AppConfig;
use crate::id::validate_slug;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `repository` is set but is not a slug
    /// - `region` is empty
    /// - a capacity or the table readiness timeout is zero
    /// - only one of `access_key_id` / `secret_access_key` is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(repository) = &self.repository {
            validate_slug(repository)
                .map_err(|e| ConfigError::Invalid { field: "repository".into(), reason: e.to_string() })?;
        }

        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "region".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [("read_capacity", self.read_capacity), ("write_capacity", self.write_capacity)] {
            if value <= 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
        }

        if self.table_ready_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "table_ready_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(ConfigError::Invalid {
                field: "access_key_id/secret_access_key".into(),
                reason: "both must be set together".into(),
            });
        }

        if self.endpoint_url.is_some() && self.access_key_id.is_none() {
            tracing::warn!("endpoint_url is set without explicit credentials; the default credential chain will be used");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &AppConfig) -> Option<String> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_repository_slug() {
        let config = AppConfig { repository: Some("team/a".into()), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("repository"));

        let config = AppConfig { repository: Some("team-a".into()), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_capacity() {
        let config = AppConfig { read_capacity: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("read_capacity"));

        let config = AppConfig { write_capacity: -3, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("write_capacity"));
    }

    #[test]
    fn test_validate_timeout_and_region() {
        let config = AppConfig { table_ready_timeout_secs: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("table_ready_timeout_secs"));

        let config = AppConfig { region: " ".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("region"));
    }

    #[test]
    fn test_validate_credentials_pair() {
        let config = AppConfig { access_key_id: Some("AKIA".into()), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("access_key_id/secret_access_key"));
    }
}
