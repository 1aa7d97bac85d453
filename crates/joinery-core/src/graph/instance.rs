//! Instance descriptors: how one object of a family is produced.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::property::{DependencyResolver, Properties, PropertyReader, PropertyValue};
use crate::error::{BuildError, BuildResult, TypeResult};
use crate::foundation::object::{ContractId, Object, erase};
use crate::foundation::types::{TypeRef, TypeRegistry};

/// Factory of a constructed instance.
pub type Factory = Arc<dyn Fn() -> anyhow::Result<Object> + Send + Sync>;

/// The three ways an instance can produce its object.
#[derive(Clone)]
pub enum InstanceKind {
    /// Built by the registered builder of `concrete` from `properties`.
    Configured {
        concrete: TypeRef,
        properties: Properties,
    },
    /// Built by calling a factory.
    Constructed { contract: ContractId, factory: Factory },
    /// An existing object, returned as-is on every build.
    Prebuilt { contract: ContractId, object: Object },
}

/// Key identifying an instance inside its family: its name, or its position
/// when unnamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKey {
    Named(String),
    Anonymous(usize),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "'{name}'"),
            Self::Anonymous(index) => write!(f, "#{index}"),
        }
    }
}

/// Descriptor of one object in a plugin family.
#[derive(Clone)]
pub struct Instance {
    name: Option<String>,
    kind: InstanceKind,
}

impl Instance {
    /// An instance built from properties by the builder registered for `concrete`.
    pub fn configured(concrete: impl Into<TypeRef>) -> Self {
        Self {
            name: None,
            kind: InstanceKind::Configured {
                concrete: concrete.into(),
                properties: Properties::new(),
            },
        }
    }

    /// An instance built by calling `factory` for the contract `C`.
    pub fn constructed_by<C, F>(factory: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn() -> anyhow::Result<Arc<C>> + Send + Sync + 'static,
    {
        Self {
            name: None,
            kind: InstanceKind::Constructed {
                contract: ContractId::of::<C>(),
                factory: Arc::new(move || factory().map(erase)),
            },
        }
    }

    /// An instance wrapping an already built object of the contract `C`.
    pub fn object<C: ?Sized + Send + Sync + 'static>(object: Arc<C>) -> Self {
        Self {
            name: None,
            kind: InstanceKind::Prebuilt {
                contract: ContractId::of::<C>(),
                object: erase(object),
            },
        }
    }

    /// Sets the instance name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a property.
    ///
    /// Only configured instances carry properties; factories and prebuilt
    /// objects drop the value with a warning.
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        if let InstanceKind::Configured { properties, .. } = &mut self.kind {
            properties.set(name, value);
        } else {
            warn!(
                instance = %self.description(),
                property = %name.into(),
                "Property set on an instance that is not configured, ignoring"
            );
        }
        self
    }

    /// Sets a literal property.
    pub fn with_literal(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_property(name, PropertyValue::literal(value))
    }

    /// Sets a property referencing the instance named `instance`.
    pub fn with_reference(self, name: impl Into<String>, instance: impl Into<String>) -> Self {
        self.with_property(name, PropertyValue::reference(instance))
    }

    /// Sets a property built from an inline child instance.
    pub fn with_child(self, name: impl Into<String>, child: Instance) -> Self {
        self.with_property(name, PropertyValue::child(child))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Properties of a configured instance.
    pub fn properties(&self) -> Option<&Properties> {
        match &self.kind {
            InstanceKind::Configured { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn kind(&self) -> &InstanceKind {
        &self.kind
    }

    /// Human-readable description used in errors and logs.
    pub fn description(&self) -> String {
        match (&self.name, &self.kind) {
            (Some(name), _) => format!("'{name}'"),
            (None, InstanceKind::Configured { concrete, .. }) => format!("<{concrete}>"),
            (None, InstanceKind::Constructed { contract, .. }) => {
                format!("<factory of {contract}>")
            }
            (None, InstanceKind::Prebuilt { contract, .. }) => format!("<object of {contract}>"),
        }
    }

    /// Returns `true` if objects of this instance can be used as `contract`.
    ///
    /// Resolves the concrete type of configured instances against `types`.
    pub fn can_plug(&self, contract: ContractId, types: &TypeRegistry) -> TypeResult<bool> {
        match &self.kind {
            InstanceKind::Configured { concrete, .. } => {
                let handle = concrete.resolve(types)?;
                Ok(handle.is_concrete() && handle.can_plug(contract))
            }
            InstanceKind::Constructed { contract: own, .. }
            | InstanceKind::Prebuilt { contract: own, .. } => Ok(*own == contract),
        }
    }

    /// Produces the object for `contract`.
    ///
    /// Prebuilt instances return the identical object on every call.
    pub fn build(
        &self,
        contract: ContractId,
        types: &TypeRegistry,
        resolver: &mut dyn DependencyResolver,
    ) -> BuildResult<Object> {
        match &self.kind {
            InstanceKind::Prebuilt { contract: own, object } => {
                self.ensure_contract(*own, contract)?;
                Ok(Arc::clone(object))
            }
            InstanceKind::Constructed { contract: own, factory } => {
                self.ensure_contract(*own, contract)?;
                factory().map_err(|source| BuildError::Construction {
                    contract: contract.to_string(),
                    instance: self.description(),
                    source,
                })
            }
            InstanceKind::Configured { concrete, properties } => {
                let description = self.description();
                let handle = concrete
                    .resolve(types)
                    .map_err(|source| BuildError::UnresolvedType {
                        instance: description.clone(),
                        source,
                    })?;

                let mut reader = PropertyReader::new(&description, properties, resolver);
                let raw = handle.construct(&mut reader).ok_or_else(|| {
                    BuildError::Construction {
                        contract: contract.to_string(),
                        instance: description.clone(),
                        source: anyhow::anyhow!("'{handle}' has no registered builder"),
                    }
                })??;

                handle
                    .upcast(raw, contract)
                    .ok_or_else(|| BuildError::ContractMismatch {
                        instance: description,
                        contract: contract.to_string(),
                    })
            }
        }
    }

    fn ensure_contract(&self, own: ContractId, requested: ContractId) -> BuildResult<()> {
        if own == requested {
            Ok(())
        } else {
            Err(BuildError::ContractMismatch {
                instance: self.description(),
                contract: requested.to_string(),
            })
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Instance");
        s.field("name", &self.name);
        match &self.kind {
            InstanceKind::Configured { concrete, properties } => s
                .field("concrete", concrete)
                .field("properties", properties),
            InstanceKind::Constructed { contract, .. } => s.field("factory_of", contract),
            InstanceKind::Prebuilt { contract, .. } => s.field("object_of", contract),
        };
        s.finish()
    }
}
