//! Configuration module for the Joinery runtime.
//!
//! This module provides layered configuration loading and validation for
//! logging, graph building and container settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ContainerConfig, GraphConfig, JoineryConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
