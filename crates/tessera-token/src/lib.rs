//! # tessera-token
//!
//! Self-signed, time-bounded tokens for tessera.
//!
//! This crate provides functionality for:
//! - Generating and loading the shared HS256 secret key
//! - Encoding a claims set into a signed `header.payload.signature` token
//! - Verifying a token's signature and expiry and returning its claims
//! - Inspecting a token without verification (for debugging)
//!
//! ## Verification verdicts
//!
//! | Rejection | Condition |
//! |-----------|-----------|
//! | `Malformed` | wrong segment count, bad base64 or JSON, non-integer `exp` |
//! | `UnsupportedType` | header `typ` is not `TOKEN` |
//! | `UnsupportedAlgorithm` | header `alg` is not `HS256` |
//! | `BadSignature` | signature does not match |
//! | `Expired` | `exp` is not strictly after the verification time |
//!
//! ```
//! use tessera_token::{Claims, SecretKey, TokenEncoder, TokenVerifier};
//!
//! let key = SecretKey::new(b"k".to_vec()).unwrap();
//! let claims = Claims::new().with("name", "alice").with_expiry(1_700_000_100);
//!
//! let token = TokenEncoder::new(&key).encode(&claims).unwrap();
//! let verified = TokenVerifier::new(&key).verify(&token, 1_700_000_000).unwrap();
//! assert_eq!(verified.get_str("name").unwrap(), "alice");
//! ```

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use claims::{ClaimValue, Claims, EXPIRY_CLAIM};
pub use error::{Rejection, TokenError};
pub use keys::SecretKey;
pub use token::{
    ALGORITHM, Header, TOKEN_TYPE, TokenEncoder, TokenInfo, TokenVerifier, VerificationResult,
    encode, inspect_token_unverified, verify,
};
