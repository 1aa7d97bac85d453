//! Property values of configured instances and the reader handed to builders.
//!
//! A configured instance carries an ordered list of named [`PropertyValue`]s.
//! When the instance is built, the registered builder function of its concrete
//! type receives a [`PropertyReader`] that converts literals with `serde` and
//! resolves dependencies through a [`DependencyResolver`] supplied by the
//! container.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::instance::Instance;
use crate::error::{BuildError, BuildResult};
use crate::foundation::object::{ContractId, Object, downcast};

// =============================================================================
// Property Values
// =============================================================================

/// Source of one property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A literal converted to the requested type on read.
    Literal(serde_json::Value),
    /// Another instance of the property's contract: the named one, or the
    /// family default when `None`.
    Reference(Option<String>),
    /// An inline instance built for this property only.
    Child(Box<Instance>),
    /// Several references or children, for list-valued dependencies.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// A literal value.
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::Literal(value.into())
    }

    /// A reference to the instance named `name`.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(Some(name.into()))
    }

    /// A reference to the default instance of the property's contract.
    pub fn default_reference() -> Self {
        Self::Reference(None)
    }

    /// An inline child instance.
    pub fn child(instance: Instance) -> Self {
        Self::Child(Box::new(instance))
    }

    /// A list of references or children.
    pub fn list(items: impl IntoIterator<Item = PropertyValue>) -> Self {
        Self::List(items.into_iter().collect())
    }
}

/// Ordered property bag.  Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`.
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Dependency Resolution
// =============================================================================

/// Resolves dependencies on behalf of a [`PropertyReader`].
///
/// Implemented by the container's build session, which carries the cycle
/// detection state of the current top-level resolution.
pub trait DependencyResolver {
    /// Resolves the named instance of `contract`, or its default when `name` is `None`.
    fn resolve(&mut self, contract: ContractId, name: Option<&str>) -> BuildResult<Object>;

    /// Resolves every instance of `contract` in registration order.
    fn resolve_all(&mut self, contract: ContractId) -> BuildResult<Vec<Object>>;

    /// Builds an inline child instance for `contract`.
    fn build_child(&mut self, contract: ContractId, instance: &Instance) -> BuildResult<Object>;
}

/// A concrete type that can be built from a property bag.
///
/// Usually derived with `#[derive(Configurable)]`.
pub trait Configurable: Sized + Send + Sync + 'static {
    /// Builds the value from the properties of a configured instance.
    fn from_properties(props: &mut PropertyReader<'_>) -> BuildResult<Self>;
}

// =============================================================================
// Property Reader
// =============================================================================

/// Typed access to the properties of the instance being built.
pub struct PropertyReader<'a> {
    instance: &'a str,
    properties: &'a Properties,
    resolver: &'a mut dyn DependencyResolver,
}

impl<'a> PropertyReader<'a> {
    /// Creates a reader over `properties` for the instance described by `instance`.
    pub fn new(
        instance: &'a str,
        properties: &'a Properties,
        resolver: &'a mut dyn DependencyResolver,
    ) -> Self {
        Self {
            instance,
            properties,
            resolver,
        }
    }

    /// Description of the instance being built, for error messages.
    pub fn instance(&self) -> &str {
        self.instance
    }

    /// Returns `true` if `name` is set.
    pub fn has(&self, name: &str) -> bool {
        self.properties.get(name).is_some()
    }

    /// Reads a required literal.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> BuildResult<T> {
        self.optional(name)?.ok_or_else(|| BuildError::MissingProperty {
            instance: self.instance.to_string(),
            property: name.to_string(),
        })
    }

    /// Reads an optional literal.
    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> BuildResult<Option<T>> {
        match self.properties.get(name) {
            None => Ok(None),
            Some(PropertyValue::Literal(value)) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.invalid(name, e.to_string())),
            Some(_) => Err(self.invalid(name, "expected a literal value".to_string())),
        }
    }

    /// Reads a literal, falling back to `T::default()` when unset.
    pub fn value_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> BuildResult<T> {
        Ok(self.optional(name)?.unwrap_or_default())
    }

    /// Resolves a dependency on the contract `C`.
    ///
    /// A reference resolves the named (or default) instance, a child is built
    /// inline, and a string literal is taken as an instance name.  When the
    /// property is unset, the default instance of `C` is used.
    pub fn dependency<C>(&mut self, name: &str) -> BuildResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let contract = ContractId::of::<C>();
        let properties = self.properties;
        let object = match properties.get(name) {
            None => self.resolver.resolve(contract, None)?,
            Some(value) => self.resolve_value(name, contract, value)?,
        };
        self.typed(contract, &object)
    }

    /// Resolves a list of dependencies on the contract `C`.
    ///
    /// When the property is unset, every instance of `C` is resolved.
    pub fn dependencies<C: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &str,
    ) -> BuildResult<Vec<Arc<C>>> {
        let contract = ContractId::of::<C>();
        let properties = self.properties;
        let objects = match properties.get(name) {
            None => self.resolver.resolve_all(contract)?,
            Some(PropertyValue::List(items)) => items
                .iter()
                .map(|item| self.resolve_value(name, contract, item))
                .collect::<BuildResult<Vec<_>>>()?,
            Some(value) => vec![self.resolve_value(name, contract, value)?],
        };
        objects.iter().map(|o| self.typed(contract, o)).collect()
    }

    fn resolve_value(
        &mut self,
        name: &str,
        contract: ContractId,
        value: &PropertyValue,
    ) -> BuildResult<Object> {
        match value {
            PropertyValue::Reference(instance) => {
                self.resolver.resolve(contract, instance.as_deref())
            }
            PropertyValue::Child(child) => self.resolver.build_child(contract, child),
            PropertyValue::Literal(serde_json::Value::String(instance)) => {
                self.resolver.resolve(contract, Some(instance))
            }
            PropertyValue::Literal(_) | PropertyValue::List(_) => Err(self.invalid(
                name,
                format!("expected a reference to '{contract}'"),
            )),
        }
    }

    fn typed<C: ?Sized + Send + Sync + 'static>(
        &self,
        contract: ContractId,
        object: &Object,
    ) -> BuildResult<Arc<C>> {
        downcast::<C>(object).ok_or_else(|| BuildError::ContractMismatch {
            instance: self.instance.to_string(),
            contract: contract.to_string(),
        })
    }

    fn invalid(&self, name: &str, reason: String) -> BuildError {
        BuildError::InvalidProperty {
            instance: self.instance.to_string(),
            property: name.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::error::ErrorCode;
    use crate::foundation::object::erase;

    trait Engine: Send + Sync {
        fn power(&self) -> u32;
    }

    struct Diesel(u32);

    impl Engine for Diesel {
        fn power(&self) -> u32 {
            self.0
        }
    }

    /// Resolves engines by name from a fixed table; the default is keyed by "".
    #[derive(Default)]
    struct TableResolver {
        engines: HashMap<String, Arc<dyn Engine>>,
        order: Vec<String>,
    }

    impl TableResolver {
        fn with(mut self, name: &str, power: u32) -> Self {
            self.engines.insert(name.to_string(), Arc::new(Diesel(power)));
            self.order.push(name.to_string());
            self
        }
    }

    impl DependencyResolver for TableResolver {
        fn resolve(&mut self, contract: ContractId, name: Option<&str>) -> BuildResult<Object> {
            self.engines
                .get(name.unwrap_or(""))
                .map(|e| erase(Arc::clone(e)))
                .ok_or_else(|| BuildError::UnknownInstanceName {
                    contract: contract.to_string(),
                    name: name.unwrap_or("").to_string(),
                })
        }

        fn resolve_all(&mut self, _contract: ContractId) -> BuildResult<Vec<Object>> {
            Ok(self
                .order
                .iter()
                .map(|n| erase(Arc::clone(&self.engines[n])))
                .collect())
        }

        fn build_child(
            &mut self,
            _contract: ContractId,
            _instance: &Instance,
        ) -> BuildResult<Object> {
            let engine: Arc<dyn Engine> = Arc::new(Diesel(1));
            Ok(erase(engine))
        }
    }

    fn bag(entries: Vec<(&str, PropertyValue)>) -> Properties {
        let mut props = Properties::new();
        for (name, value) in entries {
            props.set(name, value);
        }
        props
    }

    #[test]
    fn test_set_replaces_in_place() {
        let props = bag(vec![
            ("a", PropertyValue::literal(1)),
            ("b", PropertyValue::literal(2)),
            ("a", PropertyValue::literal(3)),
        ]);
        let names: Vec<_> = props.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(props.get("a"), Some(PropertyValue::Literal(v)) if *v == json!(3)));
    }

    #[test]
    fn test_literal_values() {
        let props = bag(vec![
            ("color", PropertyValue::literal("Red")),
            ("size", PropertyValue::literal(3)),
        ]);
        let mut resolver = TableResolver::default();
        let reader = PropertyReader::new("'Red'", &props, &mut resolver);

        assert_eq!(reader.value::<String>("color").unwrap(), "Red");
        assert_eq!(reader.value::<u8>("size").unwrap(), 3);
        assert_eq!(reader.optional::<String>("shade").unwrap(), None);
        assert_eq!(reader.value_or_default::<u32>("shade").unwrap(), 0);
        assert!(reader.has("color"));
    }

    #[test]
    fn test_missing_and_invalid_properties() {
        let props = bag(vec![("size", PropertyValue::literal("big"))]);
        let mut resolver = TableResolver::default();
        let reader = PropertyReader::new("'Red'", &props, &mut resolver);

        let missing = reader.value::<String>("color").unwrap_err();
        assert!(matches!(
            missing,
            BuildError::MissingProperty { ref property, .. } if property == "color"
        ));
        assert_eq!(missing.code(), ErrorCode::PropertyFailed);

        let invalid = reader.value::<u32>("size").unwrap_err();
        assert!(matches!(invalid, BuildError::InvalidProperty { .. }));
        assert_eq!(invalid.code(), ErrorCode::PropertyFailed);
    }

    #[test]
    fn test_dependency_sources() {
        let props = bag(vec![
            ("named", PropertyValue::reference("big")),
            ("by_literal", PropertyValue::literal("big")),
            ("inline", PropertyValue::child(Instance::object::<dyn Engine>(Arc::new(Diesel(9))))),
        ]);
        let mut resolver = TableResolver::default().with("", 100).with("big", 500);
        let mut reader = PropertyReader::new("'Car'", &props, &mut resolver);

        assert_eq!(reader.dependency::<dyn Engine>("named").unwrap().power(), 500);
        assert_eq!(reader.dependency::<dyn Engine>("by_literal").unwrap().power(), 500);
        assert_eq!(reader.dependency::<dyn Engine>("inline").unwrap().power(), 1);
        assert_eq!(reader.dependency::<dyn Engine>("unset").unwrap().power(), 100);
    }

    #[test]
    fn test_dependency_lists() {
        let props = bag(vec![(
            "engines",
            PropertyValue::list([
                PropertyValue::reference("big"),
                PropertyValue::default_reference(),
            ]),
        )]);
        let mut resolver = TableResolver::default().with("", 100).with("big", 500);
        let mut reader = PropertyReader::new("'Fleet'", &props, &mut resolver);

        let listed: Vec<_> = reader
            .dependencies::<dyn Engine>("engines")
            .unwrap()
            .iter()
            .map(|e| e.power())
            .collect();
        assert_eq!(listed, vec![500, 100]);

        let all: Vec<_> = reader
            .dependencies::<dyn Engine>("unset")
            .unwrap()
            .iter()
            .map(|e| e.power())
            .collect();
        assert_eq!(all, vec![100, 500]);
    }

    #[test]
    fn test_dependency_contract_mismatch() {
        let props = Properties::new();
        let mut resolver = TableResolver::default().with("", 100);
        let mut reader = PropertyReader::new("'Car'", &props, &mut resolver);

        let err = reader.dependency::<String>("engine").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ContractMismatch);
    }
}
