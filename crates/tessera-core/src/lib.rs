//! # tessera-core
//!
//! Configuration types shared by the tessera crates.

pub mod config;

pub use config::{ConfigError, TesseraConfig, TokenConfig};
