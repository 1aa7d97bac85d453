//! The container: resolves contracts to live, policy-wrapped objects.
//!
//! Every resolution walks
//! `family lookup → instance selection → build → interceptors → cache`:
//!
//! - An unknown contract fails with code 208, an unknown name with 200 and a
//!   missing default with 202.
//! - Singleton families cache one object per instance, thread-local families
//!   one per instance and thread; transient families never cache.
//! - Interceptors run on every build and never on cache hits.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use joinery_core::{
    BuildError, BuildResult, ContractId, DefaultSelection, DependencyResolver, Object, PluginGraph,
    TypeRef, downcast,
};

use crate::cache::ObjectCache;
use crate::session::BuildSession;

/// Options of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// How a family without a designated default picks one.
    pub default_selection: DefaultSelection,
}

/// Snapshot of a container's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStats {
    pub families: usize,
    pub instances: usize,
    pub cached_objects: usize,
    pub errors: usize,
}

impl fmt::Display for ContainerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} families, {} instances, {} cached objects, {} configuration errors",
            self.families, self.instances, self.cached_objects, self.errors
        )
    }
}

/// Read-only façade over a built [`PluginGraph`].
///
/// `Container` is `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Container {
    graph: Arc<PluginGraph>,
    cache: ObjectCache,
    options: ContainerOptions,
}

impl Container {
    pub fn new(graph: PluginGraph) -> Self {
        Self::with_options(graph, ContainerOptions::default())
    }

    pub fn with_options(graph: PluginGraph, options: ContainerOptions) -> Self {
        Self::from_shared(Arc::new(graph), options)
    }

    /// Creates a container over a graph that is shared with other containers.
    /// Each container keeps its own cache.
    pub fn from_shared(graph: Arc<PluginGraph>, options: ContainerOptions) -> Self {
        Self {
            graph,
            cache: ObjectCache::new(),
            options,
        }
    }

    pub fn graph(&self) -> &PluginGraph {
        &self.graph
    }

    pub fn options(&self) -> ContainerOptions {
        self.options
    }

    // ─── Typed resolution ───

    /// Resolves the default instance of `C`.
    pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> BuildResult<Arc<C>> {
        let object = self.session().resolve(ContractId::of::<C>(), None)?;
        typed(&object)
    }

    /// Resolves the instance of `C` named `name`.
    pub fn get_named<C: ?Sized + Send + Sync + 'static>(&self, name: &str) -> BuildResult<Arc<C>> {
        let object = self.session().resolve(ContractId::of::<C>(), Some(name))?;
        typed(&object)
    }

    /// Resolves every instance of `C` in registration order.
    pub fn get_all<C: ?Sized + Send + Sync + 'static>(&self) -> BuildResult<Vec<Arc<C>>> {
        self.session()
            .resolve_all(ContractId::of::<C>())?
            .iter()
            .map(typed::<C>)
            .collect()
    }

    // ─── Erased resolution ───

    /// Resolves an instance of the contract named by `contract`.
    pub fn get_object(&self, contract: &TypeRef, name: Option<&str>) -> BuildResult<Object> {
        let contract = self.contract_of(contract)?;
        self.session().resolve(contract, name)
    }

    /// Resolves every instance of the contract named by `contract`.
    pub fn get_all_objects(&self, contract: &TypeRef) -> BuildResult<Vec<Object>> {
        let contract = self.contract_of(contract)?;
        self.session().resolve_all(contract)
    }

    // ─── Cache management ───

    /// Drops the cached objects of `C`; the next resolution rebuilds them.
    pub fn eject<C: ?Sized + 'static>(&self) -> usize {
        let contract = ContractId::of::<C>();
        let ejected = self.cache.eject(contract);
        debug!(contract = %contract, ejected, "Cached objects ejected");
        ejected
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            families: self.graph.family_count(),
            instances: self.graph.instance_count(),
            cached_objects: self.cache.len(),
            errors: self.graph.error_count(),
        }
    }

    fn session(&self) -> BuildSession<'_> {
        BuildSession::new(&self.graph, &self.cache, self.options.default_selection)
    }

    fn contract_of(&self, contract: &TypeRef) -> BuildResult<ContractId> {
        contract
            .resolve(self.graph.types())
            .map(|handle| handle.contract_id())
            .map_err(|_| BuildError::UnknownPluginType {
                contract: contract.raw().to_string(),
            })
    }
}

fn typed<C: ?Sized + Send + Sync + 'static>(object: &Object) -> BuildResult<Arc<C>> {
    downcast::<C>(object).ok_or_else(|| BuildError::ContractMismatch {
        instance: "<resolved object>".to_string(),
        contract: ContractId::of::<C>().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use joinery_core::{
        BuildResult, ErrorCode, Instance, PropertyReader, PropertyValue, TypeRegistry,
    };

    use super::*;
    use crate::builder::build_graph;
    use crate::registry::Registry;

    // ─── Fixtures ───

    trait Service: Send + Sync {
        fn color(&self) -> String;
    }

    struct ColorService {
        color: String,
    }

    impl Service for ColorService {
        fn color(&self) -> String {
            self.color.clone()
        }
    }

    struct DecoratorService {
        inner: Arc<dyn Service>,
    }

    impl Service for DecoratorService {
        fn color(&self) -> String {
            format!("Decorated {}", self.inner.color())
        }
    }

    trait Node: Send + Sync {
        fn depth(&self) -> usize;
    }

    struct Leaf;

    impl Node for Leaf {
        fn depth(&self) -> usize {
            0
        }
    }

    struct Branch {
        child: Arc<dyn Node>,
    }

    impl Node for Branch {
        fn depth(&self) -> usize {
            self.child.depth() + 1
        }
    }

    fn build_color(props: &mut PropertyReader<'_>) -> BuildResult<ColorService> {
        Ok(ColorService {
            color: props.value("color")?,
        })
    }

    fn build_branch(props: &mut PropertyReader<'_>) -> BuildResult<Branch> {
        Ok(Branch {
            child: props.dependency("child")?,
        })
    }

    fn types() -> Arc<TypeRegistry> {
        let mut types = TypeRegistry::new();
        types.assembly("widgets", |asm| {
            asm.contract::<dyn Service>("Service");
            asm.concrete_with("ColorService", build_color)
                .plugs::<dyn Service>(|c| c);
            asm.contract::<dyn Node>("Node");
            asm.concrete_with("Leaf", |_| Ok(Leaf)).plugs::<dyn Node>(|n| n);
            asm.concrete_with("Branch", build_branch)
                .plugs::<dyn Node>(|n| n);
        });
        Arc::new(types)
    }

    fn colored(name: &str) -> Instance {
        Instance::configured("ColorService")
            .named(name)
            .with_literal("color", name)
    }

    fn colors(registry: &mut Registry) -> crate::registry::FamilyExpression<'_> {
        registry
            .for_type::<dyn Service>()
            .add(colored("Red"))
            .add(Instance::object::<dyn Service>(Arc::new(ColorService {
                color: "Yellow".into(),
            }))
            .named("Yellow"))
            .add(
                Instance::constructed_by::<dyn Service, _>(|| {
                    Ok(Arc::new(ColorService {
                        color: "Purple".into(),
                    }) as Arc<dyn Service>)
                })
                .named("Purple"),
            )
    }

    fn container(registry: Registry) -> Container {
        let (graph, errors) = build_graph(types(), &[registry]);
        assert_eq!(errors, 0, "{}", graph.log().report());
        Container::new(graph)
    }

    // ─── Selection ───

    #[test]
    fn test_resolve_by_name() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);

        for name in ["Red", "Yellow", "Purple"] {
            assert_eq!(container.get_named::<dyn Service>(name).unwrap().color(), name);
        }
    }

    #[test]
    fn test_prebuilt_is_identical_and_transient_is_distinct() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);

        let a = container.get_named::<dyn Service>("Yellow").unwrap();
        let b = container.get_named::<dyn Service>("Yellow").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let a = container.get_named::<dyn Service>("Red").unwrap();
        let b = container.get_named::<dyn Service>("Red").unwrap();
        assert_eq!(a.color(), b.color());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_contract_and_name() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);

        let err = container.get::<dyn Node>().err().unwrap();
        assert_eq!(err.code(), ErrorCode::UnknownPluginType);

        let err = container.get_named::<dyn Service>("Blue").err().unwrap();
        assert_eq!(err.code(), ErrorCode::UnknownInstanceName);

        let err = container.get::<dyn Service>().err().unwrap();
        assert_eq!(err.code(), ErrorCode::NoDefaultInstance);
    }

    #[test]
    fn test_default_instance() {
        let mut registry = Registry::new();
        colors(&mut registry).default_named("Purple");
        let container = container(registry);
        assert_eq!(container.get::<dyn Service>().unwrap().color(), "Purple");
    }

    #[test]
    fn test_first_registered_selection() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let (graph, _) = build_graph(types(), &[registry]);
        let container = Container::with_options(
            graph,
            ContainerOptions {
                default_selection: DefaultSelection::FirstRegistered,
            },
        );
        assert_eq!(container.get::<dyn Service>().unwrap().color(), "Red");
    }

    #[test]
    fn test_get_all_in_order() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);

        let all: Vec<_> = container
            .get_all::<dyn Service>()
            .unwrap()
            .iter()
            .map(|s| s.color())
            .collect();
        assert_eq!(all, vec!["Red", "Yellow", "Purple"]);
    }

    #[test]
    fn test_erased_resolution() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);

        let object = container
            .get_object(&TypeRef::new("Service,widgets"), Some("Red"))
            .unwrap();
        assert_eq!(downcast::<dyn Service>(&object).unwrap().color(), "Red");
        assert_eq!(container.get_all_objects(&TypeRef::new("Service")).unwrap().len(), 3);

        let err = container.get_object(&TypeRef::new("Missing"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownPluginType);
    }

    // ─── Lifecycles ───

    #[test]
    fn test_singleton_concurrent_first_access() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .use_default(Instance::constructed_by::<dyn Service, _>(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::yield_now();
                Ok(Arc::new(ColorService {
                    color: "Red".into(),
                }) as Arc<dyn Service>)
            }))
            .singleton();
        let container = container(registry);

        let resolved: Vec<Arc<dyn Service>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| container.get::<dyn Service>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolved.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(container.stats().cached_objects, 1);
    }

    #[test]
    fn test_thread_local_lifecycle() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .add(colored("Red"))
            .thread_local();
        let container = container(registry);

        let a = container.get::<dyn Service>().unwrap();
        let b = container.get::<dyn Service>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other = thread::scope(|s| {
            s.spawn(|| container.get::<dyn Service>().unwrap())
                .join()
                .unwrap()
        });
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_eject_rebuilds() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .add(colored("Red"))
            .singleton();
        let container = container(registry);

        let first = container.get::<dyn Service>().unwrap();
        assert_eq!(container.eject::<dyn Service>(), 1);
        let second = container.get::<dyn Service>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    // ─── Interceptors ───

    #[test]
    fn test_enrich_for_all() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .use_default(colored("Green"))
            .enrich_with::<dyn Service, _>(|inner| Arc::new(DecoratorService { inner }));
        let container = container(registry);

        assert_eq!(container.get::<dyn Service>().unwrap().color(), "Decorated Green");
    }

    #[test]
    fn test_on_creation_sees_every_instance() {
        let last = Arc::new(Mutex::new(None::<Arc<dyn Service>>));
        let seen = Arc::clone(&last);

        let mut registry = Registry::new();
        colors(&mut registry)
            .add(colored("Green"))
            .on_creation::<dyn Service, _>(move |service| {
                *seen.lock().unwrap() = Some(Arc::clone(service));
            });
        let container = container(registry);

        for name in ["Red", "Purple", "Green", "Yellow"] {
            let service = container.get_named::<dyn Service>(name).unwrap();
            let observed = last.lock().unwrap().clone().unwrap();
            assert!(Arc::ptr_eq(&service, &observed), "{name} was not observed");
        }
    }

    #[test]
    fn test_hooks_do_not_fire_on_cache_hits() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .add(colored("Red"))
            .singleton()
            .on_creation::<dyn Service, _>(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let container = container(registry);

        container.get::<dyn Service>().unwrap();
        container.get::<dyn Service>().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_interceptor() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Service>()
            .add(colored("Red"))
            .intercept(joinery_core::Interceptor::enrich_erased(
                ContractId::of::<dyn Service>(),
                |_, _| Err(anyhow::anyhow!("refused")),
            ));
        let container = container(registry);

        let err = container.get::<dyn Service>().err().unwrap();
        assert_eq!(err.code(), ErrorCode::InterceptionFailed);
    }

    // ─── Dependencies ───

    #[test]
    fn test_dependencies_resolve_recursively() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Node>()
            .add(Instance::configured("Leaf").named("leaf"))
            .add(Instance::configured("Branch").named("mid").with_reference("child", "leaf"))
            .add(Instance::configured("Branch").named("top").with_reference("child", "mid"))
            .add(
                Instance::configured("Branch")
                    .named("inline")
                    .with_child("child", Instance::configured("Leaf")),
            );
        let container = container(registry);

        assert_eq!(container.get_named::<dyn Node>("top").unwrap().depth(), 2);
        assert_eq!(container.get_named::<dyn Node>("inline").unwrap().depth(), 1);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Node>()
            .add(Instance::configured("Branch").named("a").with_reference("child", "b"))
            .add(Instance::configured("Branch").named("b").with_reference("child", "a"))
            .singleton();
        let container = container(registry);

        let err = container.get_named::<dyn Node>("a").err().unwrap();
        assert_eq!(err.code(), ErrorCode::CyclicDependency);
        let BuildError::CyclicDependency { ref path, .. } = err else {
            panic!("expected a cycle, got {err}");
        };
        assert_eq!(path, "Node('a') -> Node('b') -> Node('a')");
        assert_eq!(container.stats().cached_objects, 0);
    }

    #[test]
    fn test_literal_name_reference() {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Node>()
            .add(Instance::configured("Leaf").named("leaf"))
            .add(
                Instance::configured("Branch")
                    .named("top")
                    .with_property("child", PropertyValue::literal("leaf")),
            );
        let container = container(registry);
        assert_eq!(container.get_named::<dyn Node>("top").unwrap().depth(), 1);
    }

    #[test]
    fn test_container_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }

    #[test]
    fn test_stats_display() {
        let mut registry = Registry::new();
        colors(&mut registry);
        let container = container(registry);
        assert_eq!(
            container.stats().to_string(),
            "1 families, 3 instances, 0 cached objects, 0 configuration errors"
        );
    }
}
