//! Desk configuration (teleops.toml)
//!
//! Everything has a default so the desk runs without a config file; a file,
//! when present, is validated on load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Desk configuration from teleops.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Path of the store snapshot file
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Email domain accepted at sign-in
    #[serde(default = "default_corporate_domain")]
    pub corporate_domain: String,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: i64,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("teleops-desk.json")
}

fn default_corporate_domain() -> String {
    "teleops.example".to_string()
}

fn default_session_ttl() -> i64 {
    12 * 60 * 60
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            corporate_domain: default_corporate_domain(),
            session_ttl_seconds: default_session_ttl(),
        }
    }
}

impl DeskConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: DeskConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corporate_domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "'corporate_domain' must not be empty".to_string(),
            ));
        }
        if self.corporate_domain.contains('@') {
            return Err(ConfigError::ValidationError(
                "'corporate_domain' is a domain, not an address".to_string(),
            ));
        }
        if self.session_ttl_seconds <= 0 {
            return Err(ConfigError::ValidationError(
                "'session_ttl_seconds' must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.corporate_domain, "teleops.example");
    }

    #[test]
    fn test_from_toml() {
        let config = DeskConfig::from_toml(
            r#"
            data_path = "/var/lib/teleops/desk.json"
            corporate_domain = "ops.example.co.th"
            session_ttl_seconds = 3600
            "#,
        )
        .unwrap();
        assert_eq!(config.corporate_domain, "ops.example.co.th");
        assert_eq!(config.session_ttl_seconds, 3600);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = DeskConfig::from_toml("corporate_domain = \"x.example\"").unwrap();
        assert_eq!(config.data_path, PathBuf::from("teleops-desk.json"));
    }

    #[test]
    fn test_rejects_address_as_domain() {
        let result = DeskConfig::from_toml("corporate_domain = \"ops@x.example\"");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_nonpositive_ttl() {
        let result = DeskConfig::from_toml("session_ttl_seconds = 0");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
