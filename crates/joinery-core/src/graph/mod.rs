//! Graph layer - the plugin graph and everything a family is made of.
//!
//! - Property values and the typed [`PropertyReader`]
//! - Instance descriptors ([`Instance`])
//! - Interceptors and lifecycle policies
//! - System objects created from [`InstanceMemento`]s
//! - [`PluginFamily`] and [`PluginGraph`]

pub mod family;
pub mod instance;
pub mod interceptor;
pub mod lifecycle;
pub mod plugin_graph;
pub mod property;
pub mod system;

pub use family::{AddOutcome, DefaultSelection, DuplicateNames, PluginFamily};
pub use instance::{Factory, Instance, InstanceKey, InstanceKind};
pub use interceptor::{Interceptor, InterceptorChain};
pub use lifecycle::{
    CacheScope, LifecyclePolicy, SingletonPolicy, ThreadLocalPolicy, TransientPolicy,
    default_policy,
};
pub use plugin_graph::PluginGraph;
pub use property::{Configurable, DependencyResolver, Properties, PropertyReader, PropertyValue};
pub use system::{InstanceMemento, SystemObject, SystemRegistry};
