//! Type references and the injected type registry.
//!
//! Joinery never inspects types at runtime.  Instead every type that
//! configuration may mention by name is registered up front in a
//! [`TypeRegistry`]:
//!
//! - **Contracts** are registered by name only.
//! - **Concrete types** are registered together with a builder function that
//!   turns a property bag into the typed value, and with one upcast function
//!   per contract the type can be plugged into.
//!
//! Types are grouped into named *assemblies*.  A [`TypeRef`] names a type
//! either as `Name` (searched across all assemblies) or `Name,assembly`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut types = TypeRegistry::new();
//! types.assembly("widgets", |asm| {
//!     asm.contract::<dyn Service>("Service");
//!     asm.concrete::<ColorService>("ColorService")
//!         .plugs::<dyn Service>(|c| c);
//! });
//!
//! let handle = TypeRef::new("ColorService,widgets").resolve(&types)?;
//! ```

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::object::{ContractId, Object, erase};
use crate::error::{BuildResult, TypeError, TypeResult};
use crate::graph::property::{Configurable, PropertyReader};

/// Raw concrete value produced by a registered builder: an `Arc<T>` erased to `Any`.
pub type RawObject = Arc<dyn Any + Send + Sync>;

/// Builder function of a concrete type.
pub type Constructor = Arc<dyn Fn(&mut PropertyReader<'_>) -> BuildResult<RawObject> + Send + Sync>;

type Upcast = Arc<dyn Fn(RawObject) -> Option<Object> + Send + Sync>;

// =============================================================================
// TypeHandle
// =============================================================================

struct TypeInfo {
    name: String,
    assembly: Option<String>,
    id: ContractId,
    constructor: Option<Constructor>,
    upcasts: HashMap<TypeId, Upcast>,
}

/// A resolved type.  Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeInfo>);

impl TypeHandle {
    /// A handle for a Rust type that was never registered.  It can serve as a
    /// contract but cannot be constructed.
    pub(crate) fn bare(id: ContractId) -> Self {
        Self(Arc::new(TypeInfo {
            name: id.type_name().to_string(),
            assembly: None,
            id,
            constructor: None,
            upcasts: HashMap::new(),
        }))
    }

    /// Registered name of the type.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Assembly the type was registered in, if any.
    pub fn assembly(&self) -> Option<&str> {
        self.0.assembly.as_deref()
    }

    /// Identity of the Rust type behind this handle.
    pub fn contract_id(&self) -> ContractId {
        self.0.id
    }

    /// Returns `true` if a builder function is registered for this type.
    pub fn is_concrete(&self) -> bool {
        self.0.constructor.is_some()
    }

    /// Returns `true` if a built value of this type can be used as `contract`.
    pub fn can_plug(&self, contract: ContractId) -> bool {
        self.0.upcasts.contains_key(&contract.type_id())
    }

    /// Returns `true` if both handles were produced by the same registration.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn construct(
        &self,
        props: &mut PropertyReader<'_>,
    ) -> Option<BuildResult<RawObject>> {
        self.0.constructor.as_ref().map(|build| build(props))
    }

    pub(crate) fn upcast(&self, raw: RawObject, contract: ContractId) -> Option<Object> {
        self.0
            .upcasts
            .get(&contract.type_id())
            .and_then(|cast| cast(raw))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeHandle {}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.0.name)
            .field("assembly", &self.0.assembly)
            .field("type", &self.0.id)
            .field("concrete", &self.is_concrete())
            .finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

// =============================================================================
// TypeRef
// =============================================================================

/// A textual, lazily resolved reference to a registered type.
///
/// Successful resolution is memoized and every later call returns the same
/// handle.  Failures are not cached, so a reference that failed against one
/// registry may still succeed against another.
#[derive(Clone)]
pub struct TypeRef {
    raw: String,
    id: Option<ContractId>,
    resolved: OnceLock<TypeHandle>,
}

impl TypeRef {
    /// A reference in textual form: `Name` or `Name,assembly`.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            id: None,
            resolved: OnceLock::new(),
        }
    }

    /// A reference to the Rust type `T`.  Always resolves: to the registered
    /// handle when `T` is in the registry, otherwise to a contract-only handle.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = ContractId::of::<T>();
        Self {
            raw: id.type_name().to_string(),
            id: Some(id),
            resolved: OnceLock::new(),
        }
    }

    /// The textual form.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The memoized handle, if this reference has resolved before.
    pub fn handle(&self) -> Option<&TypeHandle> {
        self.resolved.get()
    }

    /// Resolves against `registry`.
    pub fn resolve(&self, registry: &TypeRegistry) -> TypeResult<TypeHandle> {
        if let Some(handle) = self.resolved.get() {
            return Ok(handle.clone());
        }

        let handle = match self.id {
            Some(id) => registry
                .by_type_id(id.type_id())
                .cloned()
                .unwrap_or_else(|| TypeHandle::bare(id)),
            None => {
                let (name, assembly) = self.parse()?;
                registry.find(name, assembly)?
            }
        };
        Ok(self.resolved.get_or_init(|| handle).clone())
    }

    fn parse(&self) -> TypeResult<(&str, Option<&str>)> {
        let mut parts = self.raw.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let assembly = parts.next();
        if name.is_empty() || assembly == Some("") || parts.next().is_some() {
            return Err(TypeError::Unparseable(self.raw.clone()));
        }
        Ok((name, assembly))
    }
}

impl From<&str> for TypeRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TypeRef {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({:?})", self.raw)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// =============================================================================
// TypeRegistry
// =============================================================================

/// Explicit registry of contracts and concrete types, grouped by assembly.
#[derive(Default)]
pub struct TypeRegistry {
    assemblies: BTreeMap<String, Vec<TypeHandle>>,
    by_id: HashMap<TypeId, TypeHandle>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from every assembly contributed to
    /// [`ASSEMBLIES`](crate::ASSEMBLIES) at link time.
    pub fn linked() -> Self {
        let mut registry = Self::new();
        for descriptor in crate::foundation::linked::ASSEMBLIES.iter() {
            registry.assembly(descriptor.name, descriptor.register);
        }
        registry
    }

    /// Registers (or extends) the assembly `name`.
    pub fn assembly(
        &mut self,
        name: &str,
        register: impl FnOnce(&mut AssemblyBuilder),
    ) -> &mut Self {
        let mut builder = AssemblyBuilder {
            assembly: name.to_string(),
            types: Vec::new(),
        };
        register(&mut builder);

        let entries = self.assemblies.entry(name.to_string()).or_default();
        for info in builder.types {
            let handle = TypeHandle(Arc::new(info));
            if let Some(prev) = self.by_id.insert(handle.contract_id().type_id(), handle.clone()) {
                debug!(
                    type_name    = %handle.contract_id(),
                    previous     = %prev.name(),
                    replacement  = %handle.name(),
                    "Rust type registered twice, the later registration is used for typed lookups"
                );
            }
            entries.push(handle);
        }
        debug!(assembly = %name, types = entries.len(), "Assembly registered");
        self
    }

    /// Returns `true` if the assembly is registered.
    pub fn has_assembly(&self, name: &str) -> bool {
        self.assemblies.contains_key(name)
    }

    /// Names of all registered assemblies, sorted.
    pub fn assembly_names(&self) -> impl Iterator<Item = &str> {
        self.assemblies.keys().map(String::as_str)
    }

    /// Number of registered types across all assemblies.
    pub fn len(&self) -> usize {
        self.assemblies.values().map(Vec::len).sum()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the handle registered for a Rust type.
    pub fn by_type_id(&self, type_id: TypeId) -> Option<&TypeHandle> {
        self.by_id.get(&type_id)
    }

    /// Finds a type by registered name (or full Rust type name), optionally
    /// restricted to one assembly.
    pub fn find(&self, name: &str, assembly: Option<&str>) -> TypeResult<TypeHandle> {
        let matches = |h: &&TypeHandle| h.name() == name || h.contract_id().type_name() == name;

        let found = match assembly {
            Some(assembly) => self
                .assemblies
                .get(assembly)
                .ok_or_else(|| TypeError::AssemblyNotFound {
                    type_name: name.to_string(),
                    assembly: assembly.to_string(),
                })?
                .iter()
                .find(matches),
            None => self.assemblies.values().flatten().find(matches),
        };
        found
            .cloned()
            .ok_or_else(|| TypeError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, types) in &self.assemblies {
            map.entry(name, &types.iter().map(TypeHandle::name).collect::<Vec<_>>());
        }
        map.finish()
    }
}

// =============================================================================
// AssemblyBuilder
// =============================================================================

/// Collects the types of one assembly.  Passed to [`TypeRegistry::assembly`].
pub struct AssemblyBuilder {
    assembly: String,
    types: Vec<TypeInfo>,
}

impl AssemblyBuilder {
    /// Name of the assembly being registered.
    pub fn name(&self) -> &str {
        &self.assembly
    }

    /// Registers a contract under `name`.
    pub fn contract<C: ?Sized + 'static>(&mut self, name: &str) -> &mut Self {
        self.types.push(TypeInfo {
            name: name.to_string(),
            assembly: Some(self.assembly.clone()),
            id: ContractId::of::<C>(),
            constructor: None,
            upcasts: HashMap::new(),
        });
        self
    }

    /// Registers a [`Configurable`] concrete type under `name`.
    pub fn concrete<T: Configurable>(&mut self, name: &str) -> ConcreteRegistration<'_, T> {
        self.concrete_with(name, T::from_properties)
    }

    /// Registers a concrete type under `name` with an explicit builder function.
    ///
    /// The type can always be resolved as itself; add further contracts with
    /// [`ConcreteRegistration::plugs`].
    pub fn concrete_with<T, F>(&mut self, name: &str, build: F) -> ConcreteRegistration<'_, T>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut PropertyReader<'_>) -> BuildResult<T> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move |props: &mut PropertyReader<'_>| {
            build(props).map(|value| Arc::new(value) as RawObject)
        });

        self.types.push(TypeInfo {
            name: name.to_string(),
            assembly: Some(self.assembly.clone()),
            id: ContractId::of::<T>(),
            constructor: Some(constructor),
            upcasts: HashMap::new(),
        });
        let Some(info) = self.types.last_mut() else {
            unreachable!("a type was pushed above");
        };

        ConcreteRegistration {
            info,
            _marker: PhantomData,
        }
        .plugs::<T>(|value| value)
    }
}

/// Handle returned by [`AssemblyBuilder::concrete`] to declare contracts.
pub struct ConcreteRegistration<'a, T> {
    info: &'a mut TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ConcreteRegistration<'_, T> {
    /// Declares that `T` can be plugged into the contract `C`.
    pub fn plugs<C: ?Sized + Send + Sync + 'static>(self, cast: fn(Arc<T>) -> Arc<C>) -> Self {
        let upcast: Upcast = Arc::new(move |raw: RawObject| {
            raw.downcast::<T>().ok().map(|value| erase::<C>(cast(value)))
        });
        self.info.upcasts.insert(TypeId::of::<C>(), upcast);
        self
    }
}
