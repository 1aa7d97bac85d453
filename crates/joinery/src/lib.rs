//! # Joinery
//!
//! A plugin graph builder and object container.
//!
//! ## Overview
//!
//! Applications describe *what* satisfies each abstract contract (usually a
//! trait object) and Joinery works out *how* to build it: which concrete type,
//! with which properties, wired to which dependencies, cached under which
//! lifecycle and wrapped by which interceptors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐     ┌───────────┐
//! │ TypeRegistry │────▶│ GraphBuilder │────▶│ PluginGraph │────▶│ Container │──▶ Arc<dyn C>
//! │ (assemblies) │     │  + Registry  │     │ + ErrorLog  │     │  + cache  │
//! └──────────────┘     └──────────────┘     └─────────────┘     └───────────┘
//! ```
//!
//! - **Type registry**: named contracts and concrete types, grouped in assemblies
//! - **Registries**: ordered registration sources (families, instances, policies)
//! - **Plugin graph**: families keyed by contract, plus the build-time error log
//! - **Container**: resolves contracts to live objects
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use joinery::prelude::*;
//!
//! pub trait Service: Send + Sync {
//!     fn describe(&self) -> String;
//! }
//!
//! #[derive(Configurable)]
//! pub struct ColorService {
//!     color: String,
//! }
//!
//! impl Service for ColorService {
//!     fn describe(&self) -> String {
//!         self.color.clone()
//!     }
//! }
//!
//! #[assembly("widgets")]
//! fn widgets(asm: &mut AssemblyBuilder) {
//!     asm.contract::<dyn Service>("Service");
//!     asm.concrete::<ColorService>("ColorService").plugs::<dyn Service>(|c| c);
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut registry = Registry::new();
//!     registry
//!         .for_type::<dyn Service>()
//!         .use_default(Instance::configured("ColorService").named("Red").with_literal("color", "Red"))
//!         .singleton();
//!
//!     let container = Bootstrap::linked().source(registry).build()?;
//!     println!("{}", container.get::<dyn Service>()?.describe());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `macros`: `#[derive(Configurable)]` and `#[assembly]` (default)
//! - `toml-config`: `joinery.toml` configuration files (default)
//! - `yaml-config`: `joinery.yaml` configuration files
//! - `json-log`: JSON log output
//!
//! The macros expand to `::joinery_core` paths, so crates using them also
//! depend on `joinery-core`.

pub use joinery_core as core;
pub use joinery_framework as framework;
pub use joinery_runtime as runtime;

#[cfg(feature = "macros")]
pub use joinery_macros::{Configurable, assembly};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use joinery::prelude::*;
/// ```
pub mod prelude {
    // Start-up
    pub use joinery_runtime::{Bootstrap, JoineryConfig};

    // Registration
    pub use joinery_core::{
        AssemblyBuilder, Instance, InstanceMemento, Interceptor, TypeRef, TypeRegistry,
    };
    pub use joinery_framework::Registry;

    // Resolution
    pub use joinery_core::{BuildError, BuildResult, Configurable, PropertyReader};
    pub use joinery_framework::Container;

    #[cfg(feature = "macros")]
    pub use joinery_macros::{Configurable, assembly};
}
