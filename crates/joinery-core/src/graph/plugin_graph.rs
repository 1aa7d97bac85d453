//! The plugin graph: every family, the error log and the registries.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::family::PluginFamily;
use super::system::SystemRegistry;
use crate::foundation::log::ErrorLog;
use crate::foundation::object::ContractId;
use crate::foundation::types::{TypeHandle, TypeRegistry};

/// Contracts mapped to their families, plus the state a build pass threads
/// through: the error log, the injected registries and the scanned assemblies.
///
/// A graph is mutated only while it is being built and is read-only once
/// handed to a container.
#[derive(Debug)]
pub struct PluginGraph {
    families: HashMap<ContractId, PluginFamily>,
    log: ErrorLog,
    types: Arc<TypeRegistry>,
    systems: SystemRegistry,
    assemblies: BTreeSet<String>,
}

impl PluginGraph {
    /// Creates an empty graph with the built-in system objects.
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self::with_systems(types, SystemRegistry::with_defaults())
    }

    /// Creates an empty graph with a custom system registry.
    pub fn with_systems(types: Arc<TypeRegistry>, systems: SystemRegistry) -> Self {
        Self {
            families: HashMap::new(),
            log: ErrorLog::new(),
            types,
            systems,
            assemblies: BTreeSet::new(),
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    // ─── Families ───

    /// The family of `contract`, if any.
    pub fn family(&self, contract: ContractId) -> Option<&PluginFamily> {
        self.families.get(&contract)
    }

    /// The family of `contract`, created empty on first use.
    pub fn family_mut(&mut self, contract: &TypeHandle) -> &mut PluginFamily {
        self.families
            .entry(contract.contract_id())
            .or_insert_with(|| {
                debug!(contract = %contract, "Plugin family created");
                PluginFamily::new(contract.clone())
            })
    }

    pub fn families(&self) -> impl Iterator<Item = &PluginFamily> {
        self.families.values()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of instances across all families.
    pub fn instance_count(&self) -> usize {
        self.families.values().map(PluginFamily::len).sum()
    }

    // ─── Error log ───

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ErrorLog {
        &mut self.log
    }

    pub fn error_count(&self) -> usize {
        self.log.error_count()
    }

    // ─── Assemblies ───

    /// Records a scanned assembly.  Returns `false` if it was already recorded.
    pub fn record_assembly(&mut self, name: &str) -> bool {
        self.assemblies.insert(name.to_string())
    }

    pub fn has_assembly(&self, name: &str) -> bool {
        self.assemblies.contains(name)
    }

    /// Scanned assemblies, sorted.
    pub fn assemblies(&self) -> impl Iterator<Item = &str> {
        self.assemblies.iter().map(String::as_str)
    }
}
