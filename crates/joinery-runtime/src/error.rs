//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while bootstrapping a container.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Strict mode is on and graph building recorded errors.
    #[error("plugin graph has {count} configuration error(s):\n{report}")]
    Configuration {
        /// Number of recorded errors.
        count: usize,
        /// Full error-log report.
        report: String,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
