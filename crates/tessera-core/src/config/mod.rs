//! Configuration types for tessera.
//!
//! Configuration is loaded from a single YAML file (conventionally
//! `tessera.yaml`). Every section has defaults, so an empty file is a valid
//! configuration.
//!
//! ```yaml
//! token:
//!   secret_key_env: TESSERA_SECRET_KEY
//!   secret_key_file: keys/secret.key
//!   default_ttl: 15m
//!   require_expiration: true
//! ```

pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use token::TokenConfig;

/// Complete tessera configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Token issuance and verification settings.
    #[serde(default)]
    pub token: TokenConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TesseraConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration and resolve relative paths against the directory
    /// containing the config file.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(key_file) = &config.token.secret_key_file {
            if key_file.is_relative() {
                config.token.secret_key_file = Some(base_dir.join(key_file));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(env) = &self.token.secret_key_env {
            if env.trim().is_empty() {
                return Err(ConfigError::Config(
                    "token.secret_key_env must not be empty".to_string(),
                ));
            }
        }
        if let Some(ttl) = &self.token.default_ttl {
            if ttl.trim().is_empty() {
                return Err(ConfigError::Config(
                    "token.default_ttl must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
