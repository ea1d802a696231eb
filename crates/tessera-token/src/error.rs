//! Error types for the token crate.

use thiserror::Error;

/// Why a token was refused by the verifier.
///
/// The set is closed: every failed verification maps to exactly one of these.
/// None of the messages carry key or signature material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Rejection {
    /// Wrong segment count, bad base64, bad JSON, or a non-integer `exp`.
    #[error("token is malformed")]
    Malformed,

    /// Header `typ` is not the supported token type.
    #[error("unsupported token type")]
    UnsupportedType,

    /// Header `alg` is not the supported algorithm.
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    /// Signature does not match the header and payload.
    #[error("signature mismatch")]
    BadSignature,

    /// `exp` is not strictly after the verification time.
    #[error("token has expired")]
    Expired,
}

impl Rejection {
    /// Stable machine-readable name, suitable for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed",
            Rejection::UnsupportedType => "unsupported_type",
            Rejection::UnsupportedAlgorithm => "unsupported_algorithm",
            Rejection::BadSignature => "bad_signature",
            Rejection::Expired => "expired",
        }
    }
}

/// Errors that can occur outside of a verification verdict.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Claims could not be encoded.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Secret key is empty or its text form could not be decoded.
    #[error("invalid secret key: {0}")]
    InvalidKey(String),

    /// Claim is present but holds a different kind of value.
    #[error("claim {claim} is not a {expected}")]
    ClaimType {
        claim: String,
        expected: &'static str,
    },

    /// Token is missing a required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: String },

    /// Token was rejected by the verifier.
    #[error("token rejected: {0}")]
    Rejected(#[from] Rejection),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages_are_static() {
        assert_eq!(Rejection::Expired.to_string(), "token has expired");
        assert_eq!(Rejection::BadSignature.as_str(), "bad_signature");
    }

    #[test]
    fn test_rejection_converts_into_token_error() {
        let err: TokenError = Rejection::Malformed.into();
        assert!(matches!(err, TokenError::Rejected(Rejection::Malformed)));
        assert_eq!(err.to_string(), "token rejected: token is malformed");
    }
}
