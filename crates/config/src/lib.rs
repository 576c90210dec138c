//! Configuration loading for the downscope CLI.
//!
//! Uses figment for YAML-based configuration with sensible defaults,
//! overridable through `DOWNSCOPE_`-prefixed environment variables.

pub mod schema;

pub use schema::{Config, LogConfig};
