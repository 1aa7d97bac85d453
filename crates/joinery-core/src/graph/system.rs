//! System objects created by short name from serializable mementos.
//!
//! Lifecycle policies are the built-in kind: the [`SystemRegistry`] starts out
//! knowing `Transient` (alias `PerRequest`), `Singleton` and `ThreadLocal`.
//! Keys are matched case-insensitively.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lifecycle::{LifecyclePolicy, SingletonPolicy, ThreadLocalPolicy, TransientPolicy};
use crate::error::{SystemError, SystemResult};

// =============================================================================
// Instance Memento
// =============================================================================

/// Serializable description of a system object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceMemento {
    /// Short name of the concrete system object, e.g. `Singleton`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concrete_key: Option<String>,

    /// Name of the described instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,

    /// Free-form settings passed to the constructor.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl InstanceMemento {
    pub fn new(concrete_key: impl Into<String>, instance_key: impl Into<String>) -> Self {
        Self {
            concrete_key: Some(concrete_key.into()),
            instance_key: Some(instance_key.into()),
            properties: Map::new(),
        }
    }

    /// A memento naming only the concrete key.
    pub fn keyed(concrete_key: impl Into<String>) -> Self {
        Self {
            concrete_key: Some(concrete_key.into()),
            ..Self::default()
        }
    }

    /// A memento with nothing set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Reads a property, converting it with `serde`.
    pub fn property<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        self.properties
            .get(name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(anyhow::Error::from)
    }
}

// =============================================================================
// System Registry
// =============================================================================

/// A kind of system object the [`SystemRegistry`] can create.
pub trait SystemObject: Send + Sync + 'static {
    /// Name of the kind, used in error messages.
    const KIND: &'static str;
}

impl SystemObject for Arc<dyn LifecyclePolicy> {
    const KIND: &'static str = "lifecycle";
}

type SystemFactory =
    Arc<dyn Fn(&InstanceMemento) -> anyhow::Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Constructors of system objects keyed by kind and short name.
#[derive(Clone, Default)]
pub struct SystemRegistry {
    factories: HashMap<(TypeId, String), SystemFactory>,
}

impl SystemRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing the built-in lifecycle policies.
    pub fn with_defaults() -> Self {
        type Policy = Arc<dyn LifecyclePolicy>;

        let mut registry = Self::new();
        registry.register::<Policy, _>("Transient", |_| Ok(Arc::new(TransientPolicy)));
        registry.register::<Policy, _>("PerRequest", |_| Ok(Arc::new(TransientPolicy)));
        registry.register::<Policy, _>("Singleton", |_| Ok(Arc::new(SingletonPolicy)));
        registry.register::<Policy, _>("ThreadLocal", |_| Ok(Arc::new(ThreadLocalPolicy)));
        registry
    }

    /// Registers a constructor for `T` under `key`, replacing any previous one.
    pub fn register<T, F>(&mut self, key: &str, factory: F) -> &mut Self
    where
        T: SystemObject,
        F: Fn(&InstanceMemento) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let factory: SystemFactory = Arc::new(move |memento: &InstanceMemento| {
            factory(memento).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
        });
        self.factories
            .insert((TypeId::of::<T>(), key.to_ascii_lowercase()), factory);
        self
    }

    /// Returns `true` if a constructor for `T` is registered under `key`.
    pub fn contains<T: SystemObject>(&self, key: &str) -> bool {
        self.factories
            .contains_key(&(TypeId::of::<T>(), key.to_ascii_lowercase()))
    }

    /// Creates a `T` from `memento`.
    pub fn create<T: SystemObject>(&self, memento: &InstanceMemento) -> SystemResult<T> {
        let key = memento
            .concrete_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(SystemError::MissingKey { kind: T::KIND })?;

        let factory = self
            .factories
            .get(&(TypeId::of::<T>(), key.to_ascii_lowercase()))
            .ok_or_else(|| SystemError::Unknown {
                kind: T::KIND,
                key: key.to_string(),
            })?;

        let failed = |reason: String| SystemError::Failed {
            kind: T::KIND,
            key: key.to_string(),
            reason,
        };
        let value = factory(memento).map_err(|e| failed(e.to_string()))?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| failed("constructor produced the wrong kind".to_string()))
    }
}

impl fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().map(|(_, key)| key.as_str()).collect();
        keys.sort_unstable();
        f.debug_struct("SystemRegistry").field("keys", &keys).finish()
    }
}
