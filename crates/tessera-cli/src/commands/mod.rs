//! CLI command implementations for tessera.

pub mod keys;
pub mod token;
