//! One top-level resolution and the dependencies it pulls in.

use joinery_core::{
    BuildError, BuildResult, CacheScope, ContractId, DefaultSelection, DependencyResolver,
    Instance, InstanceKey, Object, PluginFamily, PluginGraph,
};
use tracing::trace;

use crate::cache::{CacheKey, ObjectCache};

/// An instance currently being built.
struct Frame {
    contract: ContractId,
    key: InstanceKey,
    label: String,
}

/// Resolution state of one `Container::get*` call.
///
/// The in-progress stack detects dependency cycles: building an instance
/// that is already being built further up the stack fails with
/// [`BuildError::CyclicDependency`].
pub(crate) struct BuildSession<'c> {
    graph: &'c PluginGraph,
    cache: &'c ObjectCache,
    selection: DefaultSelection,
    in_progress: Vec<Frame>,
}

impl<'c> BuildSession<'c> {
    pub(crate) fn new(
        graph: &'c PluginGraph,
        cache: &'c ObjectCache,
        selection: DefaultSelection,
    ) -> Self {
        Self {
            graph,
            cache,
            selection,
            in_progress: Vec::new(),
        }
    }

    fn family(&self, contract: ContractId) -> BuildResult<&'c PluginFamily> {
        let graph = self.graph;
        graph
            .family(contract)
            .ok_or_else(|| BuildError::UnknownPluginType {
                contract: graph
                    .types()
                    .by_type_id(contract.type_id())
                    .map(|h| h.name().to_string())
                    .unwrap_or_else(|| contract.to_string()),
            })
    }

    /// Resolves one instance through its family's lifecycle.
    fn resolve_instance(
        &mut self,
        family: &'c PluginFamily,
        key: InstanceKey,
        instance: &'c Instance,
    ) -> BuildResult<Object> {
        match family.lifecycle().scope() {
            CacheScope::None => self.build(family, key, instance),
            scope => {
                let cache = self.cache;
                let slot = CacheKey::new(family.contract_id(), key.clone(), scope);
                cache.get_or_build(slot, || self.build(family, key, instance))
            }
        }
    }

    /// Builds `instance` and runs the family's interceptors on the result.
    fn build(
        &mut self,
        family: &'c PluginFamily,
        key: InstanceKey,
        instance: &'c Instance,
    ) -> BuildResult<Object> {
        let contract = family.contract_id();
        let label = format!("{}({key})", family.contract().name());

        if self
            .in_progress
            .iter()
            .any(|f| f.contract == contract && f.key == key)
        {
            let path = self
                .in_progress
                .iter()
                .map(|f| f.label.as_str())
                .chain(std::iter::once(label.as_str()))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(BuildError::CyclicDependency { path });
        }

        trace!(instance = %label, "Building instance");
        self.in_progress.push(Frame {
            contract,
            key,
            label,
        });
        let result = self.build_intercepted(family, instance);
        self.in_progress.pop();
        result
    }

    fn build_intercepted(
        &mut self,
        family: &'c PluginFamily,
        instance: &Instance,
    ) -> BuildResult<Object> {
        let graph = self.graph;
        let contract = family.contract_id();
        let object = instance.build(contract, graph.types(), self)?;
        if family.interceptors().is_empty() {
            return Ok(object);
        }
        family
            .interceptors()
            .apply(object, family.contract())
            .map_err(|source| BuildError::Interception {
                contract: family.contract().to_string(),
                instance: instance.description(),
                source,
            })
    }
}

impl DependencyResolver for BuildSession<'_> {
    fn resolve(&mut self, contract: ContractId, name: Option<&str>) -> BuildResult<Object> {
        let family = self.family(contract)?;
        let (key, instance) = family.select(name, self.selection)?;
        self.resolve_instance(family, key, instance)
    }

    fn resolve_all(&mut self, contract: ContractId) -> BuildResult<Vec<Object>> {
        let family = self.family(contract)?;
        family
            .entries()
            .map(|(key, instance)| self.resolve_instance(family, key, instance))
            .collect()
    }

    fn build_child(&mut self, contract: ContractId, instance: &Instance) -> BuildResult<Object> {
        let graph = self.graph;
        match graph.family(contract) {
            Some(family) => self.build_intercepted(family, instance),
            None => instance.build(contract, graph.types(), self),
        }
    }
}
