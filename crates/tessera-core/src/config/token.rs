//! Token engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the environment variable the secret key is read from by default.
pub const DEFAULT_SECRET_KEY_ENV: &str = "TESSERA_SECRET_KEY";

/// Configuration for token issuance and verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable containing the secret key (base64, URL-safe alphabet).
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: Option<String>,

    /// Path to the secret key file.
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,

    /// Lifetime applied to newly issued tokens (e.g., "30s", "15m", "24h", "7d").
    #[serde(default = "default_ttl")]
    pub default_ttl: Option<String>,

    /// Whether verification should refuse tokens that carry no `exp` claim.
    ///
    /// The engine itself accepts such tokens; this is caller policy.
    #[serde(default)]
    pub require_expiration: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_key_env: default_secret_key_env(),
            secret_key_file: None,
            default_ttl: default_ttl(),
            require_expiration: false,
        }
    }
}

impl TokenConfig {
    /// Resolve the secret key text from environment or file.
    pub fn resolve_secret_key(&self) -> Result<Option<String>, std::io::Error> {
        // Try environment variable first
        if let Some(env_var) = &self.secret_key_env {
            if let Ok(key) = std::env::var(env_var) {
                if !key.trim().is_empty() {
                    return Ok(Some(key.trim().to_string()));
                }
            }
        }

        if let Some(path) = &self.secret_key_file {
            if path.exists() {
                let key = std::fs::read_to_string(path)?;
                return Ok(Some(key.trim().to_string()));
            }
        }

        Ok(None)
    }
}

fn default_secret_key_env() -> Option<String> {
    Some(DEFAULT_SECRET_KEY_ENV.to_string())
}

fn default_ttl() -> Option<String> {
    Some("1m".to_string())
}
