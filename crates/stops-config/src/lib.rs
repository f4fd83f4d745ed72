//! stopstats configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the config file (TOML or JSON)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation of metric catalogs and output names

pub mod config;
pub mod resolve;
pub mod validate;

pub use config::{Config, IndexConfig, RollupConfig};
pub use resolve::{ensure_valid, resolve_config, ConfigError, ConfigPaths, ConfigSource, ResolvedConfig};
pub use validate::{validate, ValidationError, ValidationResult};
