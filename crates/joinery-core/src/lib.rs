//! # Joinery Core
//!
//! The plugin graph model of the Joinery object-graph engine.
//!
//! A plugin graph maps abstract contracts (usually trait objects such as
//! `dyn Service`) to the families of instances that can satisfy them.  This
//! crate holds the data model; building graphs from configuration sources and
//! resolving objects out of them lives in `joinery-framework`.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Objects**: type-erased built objects and contract identities ([`Object`], [`ContractId`])
//! - **Types**: lazily resolved [`TypeRef`]s against an injected [`TypeRegistry`]
//! - **Link-time assemblies**: the [`ASSEMBLIES`] distributed slice
//! - **Error log**: the append-only build-time [`ErrorLog`]
//!
//! ### Graph Layer
//!
//! - **Instances**: configured, constructed and prebuilt [`Instance`]s
//! - **Properties**: [`PropertyValue`]s read through a [`PropertyReader`]
//! - **Policies**: [`LifecyclePolicy`] and [`Interceptor`]
//! - **Families and graph**: [`PluginFamily`], [`PluginGraph`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use joinery_core::{Instance, TypeRef, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types.assembly("widgets", |asm| {
//!     asm.contract::<dyn Service>("Service");
//!     asm.concrete::<ColorService>("ColorService")
//!         .plugs::<dyn Service>(|c| c);
//! });
//!
//! let red = Instance::configured("ColorService,widgets")
//!     .named("Red")
//!     .with_literal("color", "Red");
//! ```

pub mod error;
pub mod foundation;
pub mod graph;

pub use linkme;

pub use error::{
    BuildError, BuildResult, ErrorCode, SystemError, SystemResult, TypeError, TypeResult,
};

pub use foundation::{
    ASSEMBLIES, AssemblyBuilder, AssemblyDescriptor, ConcreteRegistration, ContractId, ErrorLog,
    LogEntry, Object, RawObject, TypeHandle, TypeRef, TypeRegistry, downcast, erase,
};

pub use graph::{
    AddOutcome, CacheScope, Configurable, DefaultSelection, DependencyResolver, DuplicateNames,
    Factory, Instance, InstanceKey, InstanceKind, InstanceMemento, Interceptor, InterceptorChain,
    LifecyclePolicy, PluginFamily, PluginGraph, Properties, PropertyReader, PropertyValue,
    SingletonPolicy, SystemObject, SystemRegistry, ThreadLocalPolicy, TransientPolicy,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{BuildError, BuildResult, ErrorCode};
    pub use super::foundation::{ContractId, Object, TypeRef, TypeRegistry, downcast};
    pub use super::graph::{
        Configurable, DefaultSelection, DuplicateNames, Instance, InstanceMemento, Interceptor,
        LifecyclePolicy, PropertyReader, PropertyValue,
    };
}
