//! Token claims.
//!
//! Claims are an open map from string keys to [`ClaimValue`]s. The only key
//! the engine interprets is [`EXPIRY_CLAIM`] (`exp`): an absolute expiry in
//! seconds since the Unix epoch.
//!
//! Keys are kept in a `BTreeMap`, so a claims set always serializes with
//! sorted keys and the same claims produce the same payload bytes.

use crate::error::{Rejection, TokenError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Reserved claim holding the absolute expiry timestamp.
pub const EXPIRY_CLAIM: &str = "exp";

/// A single claim value.
///
/// `UInteger` holds integers above `i64::MAX`; smaller non-negative integers
/// decode as `Integer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Null,
    Bool(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    String(String),
    Array(Vec<ClaimValue>),
    Object(BTreeMap<String, ClaimValue>),
}

impl ClaimValue {
    /// Short name of the variant, used in type errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ClaimValue::Null => "null",
            ClaimValue::Bool(_) => "boolean",
            ClaimValue::Integer(_) | ClaimValue::UInteger(_) => "integer",
            ClaimValue::Float(_) => "float",
            ClaimValue::String(_) => "string",
            ClaimValue::Array(_) => "array",
            ClaimValue::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            ClaimValue::UInteger(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ClaimValue::Integer(i) => u64::try_from(*i).ok(),
            ClaimValue::UInteger(u) => Some(*u),
            _ => None,
        }
    }

    /// Numeric value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ClaimValue::Integer(i) => Some(*i as f64),
            ClaimValue::UInteger(u) => Some(*u as f64),
            ClaimValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClaimValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ClaimValue]> {
        match self {
            ClaimValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ClaimValue>> {
        match self {
            ClaimValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ClaimValue::Null)
    }

    /// Whether every float inside this value is finite.
    ///
    /// JSON has no representation for NaN or infinity.
    pub fn is_encodable(&self) -> bool {
        match self {
            ClaimValue::Float(f) => f.is_finite(),
            ClaimValue::Array(items) => items.iter().all(ClaimValue::is_encodable),
            ClaimValue::Object(map) => map.values().all(ClaimValue::is_encodable),
            _ => true,
        }
    }

    /// Interpret the value as an integer timestamp.
    ///
    /// Accepts integers, and floats with no fractional part that fit in an
    /// `i64` (other encoders commonly emit `1700000000.0`).
    fn as_timestamp(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            ClaimValue::UInteger(u) => i64::try_from(*u).ok(),
            ClaimValue::Float(f)
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        ClaimValue::Integer(value.into())
    }
}

impl From<u32> for ClaimValue {
    fn from(value: u32) -> Self {
        ClaimValue::Integer(value.into())
    }
}

impl From<u64> for ClaimValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => ClaimValue::Integer(i),
            Err(_) => ClaimValue::UInteger(value),
        }
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

impl From<Vec<ClaimValue>> for ClaimValue {
    fn from(value: Vec<ClaimValue>) -> Self {
        ClaimValue::Array(value)
    }
}

impl From<BTreeMap<String, ClaimValue>> for ClaimValue {
    fn from(value: BTreeMap<String, ClaimValue>) -> Self {
        ClaimValue::Object(value)
    }
}

/// The set of claims carried by a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims {
    entries: BTreeMap<String, ClaimValue>,
}

impl Claims {
    /// Create an empty claims set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a claim, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a claim, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ClaimValue>,
    ) -> Option<ClaimValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ClaimValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate claims in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ClaimValue> {
        self.entries.iter()
    }

    /// Get a required string claim.
    pub fn get_str(&self, key: &str) -> Result<&str, TokenError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| type_error(key, "string"))
    }

    /// Get a required integer claim.
    pub fn get_i64(&self, key: &str) -> Result<i64, TokenError> {
        let value = self.require(key)?;
        value.as_i64().ok_or_else(|| type_error(key, "integer"))
    }

    /// Get a required boolean claim.
    pub fn get_bool(&self, key: &str) -> Result<bool, TokenError> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| type_error(key, "boolean"))
    }

    fn require(&self, key: &str) -> Result<&ClaimValue, TokenError> {
        self.entries.get(key).ok_or_else(|| TokenError::MissingClaim {
            claim: key.to_string(),
        })
    }

    /// Set the absolute expiry (seconds since the Unix epoch).
    pub fn set_expiry(&mut self, exp: i64) {
        self.entries
            .insert(EXPIRY_CLAIM.to_string(), ClaimValue::Integer(exp));
    }

    /// Set the absolute expiry, builder style.
    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.set_expiry(exp);
        self
    }

    /// Expire `ttl` after `now` (seconds since the Unix epoch).
    pub fn expires_in(self, now: i64, ttl: Duration) -> Self {
        self.with_expiry(now.saturating_add(ttl.num_seconds()))
    }

    /// The `exp` claim, if present.
    ///
    /// A present `exp` that is not integer-compatible makes the whole token
    /// malformed.
    pub fn expiry(&self) -> Result<Option<i64>, Rejection> {
        match self.entries.get(EXPIRY_CLAIM) {
            None => Ok(None),
            Some(value) => value.as_timestamp().map(Some).ok_or(Rejection::Malformed),
        }
    }

    /// Whether every value can be represented in the payload encoding.
    pub fn is_encodable(&self) -> bool {
        self.entries.values().all(ClaimValue::is_encodable)
    }
}

fn type_error(key: &str, expected: &'static str) -> TokenError {
    TokenError::ClaimType {
        claim: key.to_string(),
        expected,
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Claims {
    type Item = (String, ClaimValue);
    type IntoIter = btree_map::IntoIter<String, ClaimValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Claims {
    type Item = (&'a String, &'a ClaimValue);
    type IntoIter = btree_map::Iter<'a, String, ClaimValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
