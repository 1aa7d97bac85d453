//! Lifecycle policies: how long a built object is reused.

use std::fmt;
use std::sync::Arc;

/// Where built objects of a family are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Never cached; every resolution builds a new object.
    None,
    /// One object per container.
    Container,
    /// One object per calling thread.
    Thread,
}

/// Lifecycle policy of a plugin family.
///
/// Policies are system objects: they are created by name from an
/// [`InstanceMemento`](super::system::InstanceMemento) through the
/// [`SystemRegistry`](super::system::SystemRegistry), so custom policies only
/// need to choose a [`CacheScope`].
pub trait LifecyclePolicy: fmt::Debug + Send + Sync {
    /// Short name, e.g. `Singleton`.
    fn name(&self) -> &str;

    /// Cache scope of objects built under this policy.
    fn scope(&self) -> CacheScope;
}

/// Builds a new object on every resolution.  The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientPolicy;

impl LifecyclePolicy for TransientPolicy {
    fn name(&self) -> &str {
        "Transient"
    }

    fn scope(&self) -> CacheScope {
        CacheScope::None
    }
}

/// Builds at most one object per instance and container.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonPolicy;

impl LifecyclePolicy for SingletonPolicy {
    fn name(&self) -> &str {
        "Singleton"
    }

    fn scope(&self) -> CacheScope {
        CacheScope::Container
    }
}

/// Builds at most one object per instance and calling thread.
///
/// Slots are keyed by [`ThreadId`](std::thread::ThreadId) and outlive the
/// thread that filled them; they are released only when the contract is
/// ejected from the container or the container is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalPolicy;

impl LifecyclePolicy for ThreadLocalPolicy {
    fn name(&self) -> &str {
        "ThreadLocal"
    }

    fn scope(&self) -> CacheScope {
        CacheScope::Thread
    }
}

/// The policy a family starts with.
pub fn default_policy() -> Arc<dyn LifecyclePolicy> {
    Arc::new(TransientPolicy)
}
