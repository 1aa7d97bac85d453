//! Plugin families: every instance registered against one contract.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::instance::{Instance, InstanceKey};
use super::interceptor::{Interceptor, InterceptorChain};
use super::lifecycle::{LifecyclePolicy, default_policy};
use crate::error::{BuildError, BuildResult};
use crate::foundation::object::ContractId;
use crate::foundation::types::TypeHandle;

/// What happens when an instance name is registered twice in one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNames {
    /// The later instance replaces the earlier one, keeping its position.
    #[default]
    Replace,
    /// The earlier instance is kept and the later one is rejected.
    Reject,
}

/// How a family picks an instance when no name is requested and no default
/// was designated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSelection {
    /// Use the only instance; fail if there are several.
    #[default]
    SoleInstance,
    /// Always require a designated default.
    Strict,
    /// Use the first registered instance.
    FirstRegistered,
}

/// Result of [`PluginFamily::add_instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Replaced,
    Rejected,
}

/// All instances of one contract plus the family's policies.
#[derive(Debug, Clone)]
pub struct PluginFamily {
    contract: TypeHandle,
    instances: Vec<Instance>,
    default: Option<InstanceKey>,
    lifecycle: Arc<dyn LifecyclePolicy>,
    interceptors: InterceptorChain,
}

impl PluginFamily {
    /// Creates an empty family with the transient lifecycle.
    pub fn new(contract: TypeHandle) -> Self {
        Self {
            contract,
            instances: Vec::new(),
            default: None,
            lifecycle: default_policy(),
            interceptors: InterceptorChain::new(),
        }
    }

    pub fn contract(&self) -> &TypeHandle {
        &self.contract
    }

    pub fn contract_id(&self) -> ContractId {
        self.contract.contract_id()
    }

    // ─── Instances ───

    /// Adds an instance, applying `duplicates` when its name is taken.
    pub fn add_instance(&mut self, instance: Instance, duplicates: DuplicateNames) -> AddOutcome {
        let existing = instance
            .name()
            .and_then(|name| self.instances.iter().position(|i| i.name() == Some(name)));

        match (existing, duplicates) {
            (None, _) => {
                self.instances.push(instance);
                AddOutcome::Added
            }
            (Some(index), DuplicateNames::Replace) => {
                warn!(
                    contract = %self.contract,
                    instance = %instance.description(),
                    "Instance name registered twice, replacing the earlier registration"
                );
                self.instances[index] = instance;
                AddOutcome::Replaced
            }
            (Some(_), DuplicateNames::Reject) => AddOutcome::Rejected,
        }
    }

    /// Adds an instance and designates it as the default.
    pub fn use_default(&mut self, instance: Instance, duplicates: DuplicateNames) -> AddOutcome {
        let name = instance.name().map(str::to_string);
        let outcome = self.add_instance(instance, duplicates);
        if outcome != AddOutcome::Rejected {
            self.default = Some(match name {
                Some(name) => InstanceKey::Named(name),
                None => InstanceKey::Anonymous(self.instances.len() - 1),
            });
        }
        outcome
    }

    /// Designates the instance named `name` as the default.
    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = Some(InstanceKey::Named(name.into()));
    }

    /// The designated default, if any.
    pub fn default_key(&self) -> Option<&InstanceKey> {
        self.default.as_ref()
    }

    /// Returns `true` if the designated default exists in the family.
    pub fn default_is_valid(&self) -> bool {
        match &self.default {
            None => true,
            Some(InstanceKey::Named(name)) => self.find(name).is_some(),
            Some(InstanceKey::Anonymous(index)) => *index < self.instances.len(),
        }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Key of the instance at `index`.
    pub fn key_of(&self, index: usize) -> InstanceKey {
        match self.instances.get(index).and_then(Instance::name) {
            Some(name) => InstanceKey::Named(name.to_string()),
            None => InstanceKey::Anonymous(index),
        }
    }

    /// Every instance with its key, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (InstanceKey, &Instance)> {
        (0..self.instances.len()).map(|i| (self.key_of(i), &self.instances[i]))
    }

    /// The instance named `name`.
    pub fn find(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name() == Some(name))
    }

    /// Selects the instance to build: the named one, else the designated
    /// default, else whatever `selection` allows.
    pub fn select(
        &self,
        name: Option<&str>,
        selection: DefaultSelection,
    ) -> BuildResult<(InstanceKey, &Instance)> {
        if let Some(name) = name {
            return self
                .find(name)
                .map(|i| (InstanceKey::Named(name.to_string()), i))
                .ok_or_else(|| BuildError::UnknownInstanceName {
                    contract: self.contract.to_string(),
                    name: name.to_string(),
                });
        }

        let index = match &self.default {
            Some(InstanceKey::Named(name)) => self
                .instances
                .iter()
                .position(|i| i.name() == Some(name.as_str())),
            Some(InstanceKey::Anonymous(index)) => {
                Some(*index).filter(|i| *i < self.instances.len())
            }
            None => match selection {
                DefaultSelection::SoleInstance if self.instances.len() == 1 => Some(0),
                DefaultSelection::FirstRegistered if !self.instances.is_empty() => Some(0),
                _ => None,
            },
        };

        index
            .map(|i| (self.key_of(i), &self.instances[i]))
            .ok_or_else(|| BuildError::NoDefaultInstance {
                contract: self.contract.to_string(),
                instances: self.instances.len(),
            })
    }

    // ─── Policies ───

    /// Replaces the lifecycle policy.
    pub fn set_lifecycle(&mut self, policy: Arc<dyn LifecyclePolicy>) {
        self.lifecycle = policy;
    }

    pub fn lifecycle(&self) -> &Arc<dyn LifecyclePolicy> {
        &self.lifecycle
    }

    /// Appends an interceptor.
    pub fn add_interceptor(&mut self, interceptor: Interceptor) {
        self.interceptors.push(interceptor);
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::foundation::types::{TypeRef, TypeRegistry};
    use crate::graph::instance::InstanceKind;
    use crate::graph::lifecycle::{CacheScope, SingletonPolicy};

    trait Service: Send + Sync {}

    fn family() -> PluginFamily {
        PluginFamily::new(TypeRef::of::<dyn Service>().resolve(&TypeRegistry::new()).unwrap())
    }

    fn named(name: &str) -> Instance {
        Instance::configured("ColorService").named(name)
    }

    #[test]
    fn test_new_family_defaults() {
        let family = family();
        assert!(family.is_empty());
        assert_eq!(family.lifecycle().scope(), CacheScope::None);
        assert!(family.interceptors().is_empty());
        assert!(family.default_key().is_none());
    }

    #[test]
    fn test_duplicate_replace_keeps_position() {
        let mut family = family();
        family.add_instance(named("Red"), DuplicateNames::Replace);
        family.add_instance(named("Blue"), DuplicateNames::Replace);
        let outcome = family.add_instance(
            Instance::configured("Other").named("Red"),
            DuplicateNames::Replace,
        );

        assert_eq!(outcome, AddOutcome::Replaced);
        assert_eq!(family.len(), 2);
        assert_eq!(family.instances()[0].description(), "'Red'");
        let InstanceKind::Configured { concrete, .. } = family.instances()[0].kind() else {
            panic!("expected a configured instance");
        };
        assert_eq!(concrete.raw(), "Other");
    }

    #[test]
    fn test_duplicate_reject_keeps_first() {
        let mut family = family();
        family.add_instance(named("Red"), DuplicateNames::Reject);
        assert_eq!(
            family.add_instance(Instance::configured("Other").named("Red"), DuplicateNames::Reject),
            AddOutcome::Rejected
        );
        assert_eq!(family.len(), 1);
    }

    #[test]
    fn test_select_by_name() {
        let mut family = family();
        family.add_instance(named("Red"), DuplicateNames::Replace);

        let (key, _) = family.select(Some("Red"), DefaultSelection::Strict).unwrap();
        assert_eq!(key, InstanceKey::Named("Red".into()));

        let err = family.select(Some("Blue"), DefaultSelection::Strict).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownInstanceName);
    }

    #[test]
    fn test_default_selection_policies() {
        let mut family = family();
        family.add_instance(Instance::configured("ColorService"), DuplicateNames::Replace);

        assert!(family.select(None, DefaultSelection::SoleInstance).is_ok());
        assert_eq!(
            family.select(None, DefaultSelection::Strict).unwrap_err().code(),
            ErrorCode::NoDefaultInstance
        );

        family.add_instance(named("Red"), DuplicateNames::Replace);
        assert!(family.select(None, DefaultSelection::SoleInstance).is_err());
        let (key, _) = family.select(None, DefaultSelection::FirstRegistered).unwrap();
        assert_eq!(key, InstanceKey::Anonymous(0));
    }

    #[test]
    fn test_designated_default() {
        let mut family = family();
        family.add_instance(named("Red"), DuplicateNames::Replace);
        family.add_instance(named("Blue"), DuplicateNames::Replace);
        family.set_default("Blue");
        assert!(family.default_is_valid());
        let (key, _) = family.select(None, DefaultSelection::Strict).unwrap();
        assert_eq!(key, InstanceKey::Named("Blue".into()));

        family.set_default("Green");
        assert!(!family.default_is_valid());
        assert!(family.select(None, DefaultSelection::FirstRegistered).is_err());
    }

    #[test]
    fn test_use_default_anonymous() {
        let mut family = family();
        family.add_instance(named("Red"), DuplicateNames::Replace);
        family.use_default(Instance::configured("ColorService"), DuplicateNames::Replace);
        assert_eq!(family.default_key(), Some(&InstanceKey::Anonymous(1)));
        let (key, _) = family.select(None, DefaultSelection::Strict).unwrap();
        assert_eq!(key, InstanceKey::Anonymous(1));
    }

    #[test]
    fn test_lifecycle_is_replaced() {
        let mut family = family();
        family.set_lifecycle(Arc::new(SingletonPolicy));
        assert_eq!(family.lifecycle().name(), "Singleton");
    }

    #[test]
    fn test_policy_names_deserialize() {
        let duplicates: DuplicateNames = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(duplicates, DuplicateNames::Reject);
        let selection: DefaultSelection = serde_json::from_str("\"first_registered\"").unwrap();
        assert_eq!(selection, DefaultSelection::FirstRegistered);
    }
}
