//! Token creation and verification.
//!
//! A token is `H.P.S`: the base64url (unpadded) encoding of the JSON header,
//! of the JSON claims, and of `HMAC-SHA256(key, "H.P")`. The base64url
//! alphabet never produces `.`, so the segments are never escaped.

use crate::claims::Claims;
use crate::error::{Rejection, TokenError};
use crate::keys::SecretKey;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "HS256";

/// The only supported token type.
pub const TOKEN_TYPE: &str = "TOKEN";

const SEGMENT_DELIMITER: char = '.';

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying a token: the decoded claims or why it was refused.
pub type VerificationResult = Result<Claims, Rejection>;

/// Token header naming the algorithm and token type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

impl Header {
    /// The header every issued token carries.
    pub fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

fn signer(key: &SecretKey) -> Result<HmacSha256, InvalidLength> {
    HmacSha256::new_from_slice(key.as_bytes())
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, Rejection> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Rejection::Malformed)
}

fn decode_json<T: DeserializeOwned>(segment: &str) -> Result<T, Rejection> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|_| Rejection::Malformed)
}

/// Split a token into exactly three non-empty segments.
fn split_token(token: &str) -> Result<(&str, &str, &str), Rejection> {
    let mut parts = token.split(SEGMENT_DELIMITER);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(Rejection::Malformed),
    }
}

/// Issues signed tokens.
pub struct TokenEncoder<'k> {
    key: &'k SecretKey,
}

impl<'k> TokenEncoder<'k> {
    /// Create a new encoder signing with the given key.
    pub fn new(key: &'k SecretKey) -> Self {
        Self { key }
    }

    /// Encode and sign a claims set.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        if !claims.is_encodable() {
            return Err(TokenError::Encoding(
                "claims contain a non-finite number".to_string(),
            ));
        }

        let header_json = serde_json::to_vec(&Header::hs256())
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        let payload_json =
            serde_json::to_vec(claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(header_json),
            SEGMENT_DELIMITER,
            URL_SAFE_NO_PAD.encode(payload_json)
        );

        let mut mac = signer(self.key).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        tracing::debug!(
            claims = claims.len(),
            exp = ?claims.expiry().ok().flatten(),
            "Issued token"
        );

        Ok(format!(
            "{}{}{}",
            signing_input,
            SEGMENT_DELIMITER,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

/// Verifies tokens issued with the same key.
pub struct TokenVerifier<'k> {
    key: &'k SecretKey,
}

impl<'k> TokenVerifier<'k> {
    /// Create a new verifier checking against the given key.
    pub fn new(key: &'k SecretKey) -> Self {
        Self { key }
    }

    /// Verify a token at time `now` (seconds since the Unix epoch).
    ///
    /// Checks run in a fixed order and stop at the first failure: shape,
    /// header type, header algorithm, signature, payload decoding, expiry.
    /// A token whose header names another algorithm is refused before any
    /// signature is computed.
    pub fn verify(&self, token: &str, now: i64) -> VerificationResult {
        let result = self.check(token, now);
        if let Err(reason) = &result {
            tracing::debug!(reason = reason.as_str(), "Token rejected");
        }
        result
    }

    /// Verify a token against the current wall-clock time.
    pub fn verify_now(&self, token: &str) -> VerificationResult {
        self.verify(token, Utc::now().timestamp())
    }

    fn check(&self, token: &str, now: i64) -> VerificationResult {
        let (header_segment, payload_segment, signature_segment) = split_token(token)?;

        let header: Header = decode_json(header_segment)?;
        if header.typ != TOKEN_TYPE {
            return Err(Rejection::UnsupportedType);
        }
        if header.alg != ALGORITHM {
            return Err(Rejection::UnsupportedAlgorithm);
        }

        // HMAC accepts keys of any length, so this cannot fail for a SecretKey.
        let mut mac = signer(self.key).map_err(|_| Rejection::BadSignature)?;
        mac.update(header_segment.as_bytes());
        mac.update(&[SEGMENT_DELIMITER as u8]);
        mac.update(payload_segment.as_bytes());

        let claimed = decode_segment(signature_segment)?;
        // Constant-time comparison.
        mac.verify_slice(&claimed)
            .map_err(|_| Rejection::BadSignature)?;

        let claims: Claims = decode_json(payload_segment)?;
        if let Some(exp) = claims.expiry()? {
            if exp <= now {
                return Err(Rejection::Expired);
            }
        }

        Ok(claims)
    }
}

/// Encode and sign `claims` with `key`.
pub fn encode(claims: &Claims, key: &SecretKey) -> Result<String, TokenError> {
    TokenEncoder::new(key).encode(claims)
}

/// Verify `token` with `key` at time `now` (seconds since the Unix epoch).
pub fn verify(token: &str, key: &SecretKey, now: i64) -> VerificationResult {
    TokenVerifier::new(key).verify(token, now)
}

/// Decode a token without verifying its signature or expiry (for debugging).
///
/// Nothing returned here is authenticated.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, Rejection> {
    let (header_segment, payload_segment, signature_segment) = split_token(token)?;

    let header: Header = decode_json(header_segment)?;
    let claims: Claims = decode_json(payload_segment)?;
    let signature_len = decode_segment(signature_segment)?.len();

    let expires_at = claims
        .expiry()
        .ok()
        .flatten()
        .and_then(|exp| DateTime::from_timestamp(exp, 0));

    Ok(TokenInfo {
        header,
        claims,
        expires_at,
        signature_len,
    })
}

/// Information about a token (for inspection).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// Decoded header.
    pub header: Header,
    /// Decoded claims.
    pub claims: Claims,
    /// Expiry as a date, when `exp` is present and well-formed.
    pub expires_at: Option<DateTime<Utc>>,
    /// Length in bytes of the decoded signature.
    pub signature_len: usize,
}
