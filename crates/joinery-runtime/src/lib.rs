//! Joinery Runtime - start-up layer for the Joinery object-graph engine.
//!
//! This crate provides:
//! - Layered configuration (`joinery.toml`/`joinery.yaml`, `JOINERY_*`
//!   environment variables, programmatic overrides)
//! - Logging set-up driven by that configuration
//! - [`Bootstrap`], which turns registrations into a ready [`Container`]
//!
//! ```ignore
//! use joinery_runtime::Bootstrap;
//!
//! fn main() -> anyhow::Result<()> {
//!     let container = Bootstrap::linked()
//!         .with_logging()
//!         .source(registrations())
//!         .build()?;
//!
//!     let service = container.get::<dyn ColorService>()?;
//!     println!("{}", service.color());
//!     Ok(())
//! }
//! ```
//!
//! [`Container`]: joinery_framework::Container

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ContainerConfig, GraphConfig, JoineryConfig,
    LoggingConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::Bootstrap;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
