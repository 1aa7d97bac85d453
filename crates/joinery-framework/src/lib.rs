//! # Joinery Framework
//!
//! Graph building and object resolution on top of `joinery-core`.
//!
//! This layer provides:
//! - Configuration sources ([`Registry`]) holding plain [`Registration`] data
//! - The fail-soft [`GraphBuilder`] and the [`build_graph`] entry point
//! - The [`Container`] resolving contracts to live objects, with lifecycle
//!   caching, interceptors and cycle detection
//!
//! ```text
//! ┌──────────┐     ┌──────────────┐     ┌─────────────┐     ┌───────────┐
//! │ Registry │────▶│ GraphBuilder │────▶│ PluginGraph │────▶│ Container │
//! │ Registry │────▶│  (ErrorLog)  │     └─────────────┘     └───────────┘
//! └──────────┘     └──────────────┘
//! ```

pub mod builder;
pub mod cache;
pub mod container;
pub mod registry;

mod session;

pub use builder::{BuilderOptions, GraphBuilder, build_graph, build_graph_with};
pub use cache::{CacheKey, ObjectCache};
pub use container::{Container, ContainerOptions, ContainerStats};
pub use registry::{FamilyAction, FamilyExpression, Registration, Registry};
