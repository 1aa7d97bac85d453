//! Object cache shared by every resolution of one container.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::ReentrantMutex;
use tracing::debug;

use joinery_core::{BuildResult, CacheScope, ContractId, InstanceKey, Object};

/// Cache slot of one built object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    contract: ContractId,
    instance: InstanceKey,
    thread: Option<ThreadId>,
}

impl CacheKey {
    /// Slot for `instance` of `contract`; thread-scoped slots belong to the
    /// calling thread.
    pub fn new(contract: ContractId, instance: InstanceKey, scope: CacheScope) -> Self {
        Self {
            contract,
            instance,
            thread: (scope == CacheScope::Thread).then(|| thread::current().id()),
        }
    }

    pub fn contract(&self) -> ContractId {
        self.contract
    }
}

/// Built objects keyed by [`CacheKey`].
///
/// A single re-entrant lock guards the whole cache and is held while an
/// object is built.  The building thread may recursively resolve further
/// cached dependencies; other threads asking for any cached object wait and
/// then see the finished one, so each slot is built at most once.
pub struct ObjectCache {
    slots: ReentrantMutex<RefCell<HashMap<CacheKey, Object>>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self {
            slots: ReentrantMutex::new(RefCell::new(HashMap::new())),
        }
    }

    /// Returns the cached object for `key`, building and storing it on a miss.
    ///
    /// Failed builds are not cached.
    pub fn get_or_build(
        &self,
        key: CacheKey,
        build: impl FnOnce() -> BuildResult<Object>,
    ) -> BuildResult<Object> {
        let slots = self.slots.lock();
        if let Some(object) = slots.borrow().get(&key) {
            return Ok(Arc::clone(object));
        }

        let object = build()?;
        debug!(contract = %key.contract, instance = %key.instance, "Object cached");
        slots.borrow_mut().insert(key, Arc::clone(&object));
        Ok(object)
    }

    /// Drops every cached object of `contract`.  Returns how many were dropped.
    pub fn eject(&self, contract: ContractId) -> usize {
        let slots = self.slots.lock();
        let mut slots = slots.borrow_mut();
        let before = slots.len();
        slots.retain(|key, _| key.contract != contract);
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCache")
            .field("objects", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use joinery_core::{BuildError, erase};

    use super::*;

    fn key(name: &str, scope: CacheScope) -> CacheKey {
        CacheKey::new(
            ContractId::of::<String>(),
            InstanceKey::Named(name.into()),
            scope,
        )
    }

    fn text(value: &str) -> Object {
        erase(Arc::new(value.to_string()))
    }

    #[test]
    fn test_builds_once() {
        let cache = ObjectCache::new();
        let calls = AtomicUsize::new(0);
        let build = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(text("a"))
        };

        let first = cache.get_or_build(key("a", CacheScope::Container), build).unwrap();
        let second = cache.get_or_build(key("a", CacheScope::Container), build).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = ObjectCache::new();
        let err = cache.get_or_build(key("a", CacheScope::Container), || {
            Err(BuildError::CyclicDependency { path: "a".into() })
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reentrant_build() {
        let cache = ObjectCache::new();
        let outer = cache
            .get_or_build(key("outer", CacheScope::Container), || {
                cache.get_or_build(key("inner", CacheScope::Container), || Ok(text("inner")))?;
                Ok(text("outer"))
            })
            .unwrap();
        assert_eq!(*joinery_core::downcast::<String>(&outer).unwrap(), "outer");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_thread_scope_keys_differ_per_thread() {
        let here = key("a", CacheScope::Thread);
        let there = thread::spawn(|| key("a", CacheScope::Thread)).join().unwrap();
        assert_ne!(here, there);
        assert_eq!(key("a", CacheScope::Container), key("a", CacheScope::Container));
    }

    #[test]
    fn test_eject() {
        let cache = ObjectCache::new();
        cache.get_or_build(key("a", CacheScope::Container), || Ok(text("a"))).unwrap();
        cache.get_or_build(key("b", CacheScope::Container), || Ok(text("b"))).unwrap();
        assert_eq!(cache.eject(ContractId::of::<u8>()), 0);
        assert_eq!(cache.eject(ContractId::of::<String>()), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eject_drops_slots_of_finished_threads() {
        let cache = Arc::new(ObjectCache::new());
        let worker = Arc::clone(&cache);
        thread::spawn(move || {
            worker
                .get_or_build(key("a", CacheScope::Thread), || Ok(text("worker")))
                .unwrap();
        })
        .join()
        .unwrap();
        cache.get_or_build(key("a", CacheScope::Thread), || Ok(text("main"))).unwrap();

        // The worker's slot survives its thread.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.eject(ContractId::of::<String>()), 2);
        assert!(cache.is_empty());
    }
}
