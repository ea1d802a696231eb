//! Secret key management for HS256 tokens.

use crate::error::TokenError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Length in bytes of generated keys; matches the SHA-256 output size.
pub const GENERATED_KEY_LEN: usize = 32;

/// A symmetric key shared by the encoder and the verifier.
///
/// Set once at startup and passed by reference afterwards. The bytes are
/// never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Wrap raw key bytes. Empty keys are refused.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(TokenError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = vec![0u8; GENERATED_KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Load a key from its base64 (URL-safe, unpadded) text form.
    pub fn from_base64(text: &str) -> Result<Self, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Self::new(bytes)
    }

    /// Get the key as base64 text.
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Save the key to a file in its text form.
    pub fn save_to_file(&self, path: &Path) -> Result<(), TokenError> {
        std::fs::write(path, self.to_base64())?;
        Ok(())
    }

    /// Load a key from a file written by [`SecretKey::save_to_file`].
    pub fn load_from_file(path: &Path) -> Result<Self, TokenError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_base64(&text)
    }
}
