//! Parsing and validation of placer configuration files.
//!
//! This crate reads a `tessera.toml` file and produces a strongly-typed
//! [`PlacerConfig`] holding every tunable of the analytic solver, the cut
//! spreader and the strict legalizer. Every field has a default, so an empty
//! file is a valid configuration.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
