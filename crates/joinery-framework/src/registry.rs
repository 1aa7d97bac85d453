//! Configuration sources.
//!
//! A [`Registry`] is plain data: an ordered list of [`Registration`]s that a
//! [`GraphBuilder`](crate::GraphBuilder) later merges into a plugin graph.  The
//! chaining helpers only append to that list; nothing is validated until the
//! registry is applied.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = Registry::new();
//! registry.add_assembly("widgets");
//! registry
//!     .for_type::<dyn Service>()
//!     .add(Instance::configured("ColorService").named("Red").with_literal("color", "Red"))
//!     .default_named("Red")
//!     .singleton();
//! ```

use std::sync::Arc;

use joinery_core::{Instance, InstanceMemento, Interceptor, TypeRef};

/// One step applied to a family.
#[derive(Debug, Clone)]
pub enum FamilyAction {
    /// Adds an instance.
    AddInstance(Instance),
    /// Adds an instance and designates it as the default.
    UseDefault(Instance),
    /// Designates the instance with this name as the default.
    DefaultNamed(String),
    /// Sets the lifecycle policy, created from the memento.
    Lifecycle(InstanceMemento),
    /// Appends an interceptor.
    Intercept(Interceptor),
}

/// One entry of a configuration source.
#[derive(Debug, Clone)]
pub enum Registration {
    /// Declares an assembly the configuration depends on.
    AddAssembly(String),
    /// Configures the family of `contract`.
    Family {
        contract: TypeRef,
        actions: Vec<FamilyAction>,
    },
}

/// An ordered configuration source.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw registration.
    pub fn push(&mut self, registration: Registration) -> &mut Self {
        self.registrations.push(registration);
        self
    }

    /// Declares the assembly `name`.
    pub fn add_assembly(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Registration::AddAssembly(name.into()))
    }

    /// Starts configuring the family named by `contract`.
    pub fn for_contract(&mut self, contract: impl Into<TypeRef>) -> FamilyExpression<'_> {
        let index = self.registrations.len();
        self.registrations.push(Registration::Family {
            contract: contract.into(),
            actions: Vec::new(),
        });
        FamilyExpression {
            registry: self,
            index,
        }
    }

    /// Starts configuring the family of the Rust type `C`.
    pub fn for_type<C: ?Sized + 'static>(&mut self) -> FamilyExpression<'_> {
        self.for_contract(TypeRef::of::<C>())
    }

    /// Registrations in order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Chaining helper returned by [`Registry::for_contract`].
pub struct FamilyExpression<'a> {
    registry: &'a mut Registry,
    index: usize,
}

impl FamilyExpression<'_> {
    fn push(self, action: FamilyAction) -> Self {
        if let Some(Registration::Family { actions, .. }) =
            self.registry.registrations.get_mut(self.index)
        {
            actions.push(action);
        }
        self
    }

    /// Adds an instance.
    pub fn add(self, instance: Instance) -> Self {
        self.push(FamilyAction::AddInstance(instance))
    }

    /// Adds an instance and makes it the default.
    pub fn use_default(self, instance: Instance) -> Self {
        self.push(FamilyAction::UseDefault(instance))
    }

    /// Makes the instance named `name` the default.
    pub fn default_named(self, name: impl Into<String>) -> Self {
        self.push(FamilyAction::DefaultNamed(name.into()))
    }

    /// Sets the lifecycle from a memento.
    pub fn lifecycle(self, memento: InstanceMemento) -> Self {
        self.push(FamilyAction::Lifecycle(memento))
    }

    pub fn singleton(self) -> Self {
        self.lifecycle(InstanceMemento::keyed("Singleton"))
    }

    pub fn thread_local(self) -> Self {
        self.lifecycle(InstanceMemento::keyed("ThreadLocal"))
    }

    /// Appends an interceptor.
    pub fn intercept(self, interceptor: Interceptor) -> Self {
        self.push(FamilyAction::Intercept(interceptor))
    }

    /// Appends an enrichment wrapping every object of the contract `C`.
    pub fn enrich_with<C, F>(self, enrich: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<C> + Send + Sync + 'static,
    {
        self.intercept(Interceptor::enrich_with(enrich))
    }

    /// Appends a hook observing every new object of the contract `C`.
    pub fn on_creation<C, F>(self, hook: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Arc<C>) + Send + Sync + 'static,
    {
        self.intercept(Interceptor::on_creation(hook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Service: Send + Sync {}

    #[test]
    fn test_registrations_keep_order() {
        let mut registry = Registry::new();
        registry.add_assembly("widgets");
        registry
            .for_contract("Service")
            .add(Instance::configured("ColorService").named("Red"))
            .default_named("Red")
            .singleton();
        registry.for_type::<dyn Service>().thread_local();

        assert_eq!(registry.len(), 3);
        assert!(matches!(
            &registry.registrations()[0],
            Registration::AddAssembly(n) if n == "widgets"
        ));

        let Registration::Family { contract, actions } = &registry.registrations()[1] else {
            panic!("expected a family registration");
        };
        assert_eq!(contract.raw(), "Service");
        assert_eq!(actions.len(), 3);
        assert!(matches!(&actions[1], FamilyAction::DefaultNamed(n) if n == "Red"));
        assert!(matches!(
            &actions[2],
            FamilyAction::Lifecycle(m) if m.concrete_key.as_deref() == Some("Singleton")
        ));
    }
}
