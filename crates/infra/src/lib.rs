//! Infrastructure layer: configuration and cache-backed token storage.

pub mod config;
pub mod token_store;

pub use config::{AppConfig, BootstrapAdmin, ConfigError};
