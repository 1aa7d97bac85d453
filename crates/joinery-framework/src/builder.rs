//! Graph building: merging configuration sources into a plugin graph.
//!
//! The builder never fails.  Every malformed registration is recorded in the
//! graph's [`ErrorLog`] under a stable code and the pass moves on, so a single
//! build reports every problem in the configuration at once:
//!
//! | Code | Recorded when |
//! |------|---------------|
//! | 101  | an assembly is not registered |
//! | 102  | a duplicate instance name is rejected |
//! | 103  | a family contract does not resolve |
//! | 104  | an instance cannot be plugged into its family |
//! | 105  | an interceptor targets another contract |
//! | 106  | a designated default does not exist |
//! | 130  | a system object cannot be created |
//! | 131  | a type reference does not resolve |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use joinery_core::{
    AddOutcome, DuplicateNames, ErrorCode, ErrorLog, Instance, InstanceKey, InstanceKind,
    InstanceMemento,
    LifecyclePolicy, PluginFamily, PluginGraph, SystemObject, SystemRegistry, TypeHandle, TypeRef,
    TypeRegistry,
};

use crate::registry::{FamilyAction, Registration, Registry};

/// Options of a graph build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Handling of instance names registered twice in one family.
    pub duplicate_names: DuplicateNames,
}

/// Builds a [`PluginGraph`] from any number of configuration sources.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: PluginGraph,
    options: BuilderOptions,
    /// Every `DefaultNamed` designation, checked once the pass finishes.
    designations: Vec<(TypeHandle, String)>,
}

impl GraphBuilder {
    /// Creates a builder with default options and the built-in system objects.
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self::with_options(types, BuilderOptions::default())
    }

    pub fn with_options(types: Arc<TypeRegistry>, options: BuilderOptions) -> Self {
        Self {
            graph: PluginGraph::new(types),
            options,
            designations: Vec::new(),
        }
    }

    /// Creates a builder using a custom system registry.
    pub fn with_systems(
        types: Arc<TypeRegistry>,
        systems: SystemRegistry,
        options: BuilderOptions,
    ) -> Self {
        Self {
            graph: PluginGraph::with_systems(types, systems),
            options,
            designations: Vec::new(),
        }
    }

    /// The graph built so far.
    pub fn graph(&self) -> &PluginGraph {
        &self.graph
    }

    pub fn log(&self) -> &ErrorLog {
        self.graph.log()
    }

    // ─── Primitive operations ───

    /// Records `name` as a scanned assembly, or logs 101 if the type registry
    /// does not know it.
    pub fn add_assembly(&mut self, name: &str) {
        if self.graph.types().has_assembly(name) {
            if self.graph.record_assembly(name) {
                debug!(assembly = %name, "Assembly added");
            }
        } else {
            self.graph.log_mut().record(
                ErrorCode::AssemblyNotFound,
                format!("assembly '{name}' could not be found"),
                Some(name.to_string()),
            );
        }
    }

    /// Resolves `contract` and runs `action` on its family, creating the
    /// family if needed.  Logs 103 and skips `action` when the contract does
    /// not resolve.
    pub fn configure_family(&mut self, contract: &TypeRef, action: impl FnOnce(&mut PluginFamily)) {
        if let Some(handle) = self.family_handle(contract) {
            action(self.graph.family_mut(&handle));
        }
    }

    /// Creates a system object of kind `T` from `memento` and hands it to
    /// `action`.  Logs 130 and skips `action` on failure.
    pub fn with_system_object<T: SystemObject>(
        &mut self,
        memento: &InstanceMemento,
        label: &str,
        action: impl FnOnce(T),
    ) {
        match self.graph.systems().create::<T>(memento) {
            Ok(object) => action(object),
            Err(err) => self.graph.log_mut().record(
                ErrorCode::SystemObjectFailed,
                format!("could not create the {label}: {err}"),
                memento.concrete_key.clone(),
            ),
        }
    }

    /// Resolves `type_ref` and hands the handle to `action`.  Logs 131 and
    /// skips `action` on failure.
    pub fn with_type(&mut self, type_ref: &TypeRef, label: &str, action: impl FnOnce(TypeHandle)) {
        match type_ref.resolve(self.graph.types()) {
            Ok(handle) => action(handle),
            Err(err) => self.graph.log_mut().record(
                ErrorCode::TypeNotFound,
                format!("could not resolve the {label}: {err}"),
                Some(type_ref.raw().to_string()),
            ),
        }
    }

    // ─── Configuration sources ───

    /// Applies every registration of `registry` in order.
    pub fn apply(&mut self, registry: &Registry) -> &mut Self {
        for registration in registry.registrations() {
            match registration {
                Registration::AddAssembly(name) => self.add_assembly(name),
                Registration::Family { contract, actions } => {
                    let Some(handle) = self.family_handle(contract) else {
                        continue;
                    };
                    self.graph.family_mut(&handle);
                    for action in actions {
                        self.apply_action(&handle, action);
                    }
                }
            }
        }
        self
    }

    /// Finishes the pass: checks designated defaults (106) and returns the graph.
    ///
    /// Each `DefaultNamed` designation naming a missing instance logs one
    /// entry, even when a later designation replaced it.
    pub fn build(mut self) -> PluginGraph {
        let mut dangling: Vec<(String, String)> = self
            .designations
            .iter()
            .filter(|(contract, name)| {
                self.graph
                    .family(contract.contract_id())
                    .is_none_or(|family| family.find(name).is_none())
            })
            .map(|(contract, name)| (contract.to_string(), format!("'{name}'")))
            .collect();

        // Defaults set directly through `configure_family`.
        dangling.extend(
            self.graph
                .families()
                .filter(|f| !f.default_is_valid())
                .filter(|f| {
                    !matches!(
                        f.default_key(),
                        Some(InstanceKey::Named(name)) if self.designations.iter().any(|(c, n)| {
                            c.contract_id() == f.contract_id() && n == name
                        })
                    )
                })
                .map(|f| {
                    let default = f.default_key().map(ToString::to_string).unwrap_or_default();
                    (f.contract().to_string(), default)
                }),
        );

        for (contract, default) in dangling {
            self.graph.log_mut().record(
                ErrorCode::UnknownDefaultInstance,
                format!("default instance {default} is not registered for '{contract}'"),
                Some(contract),
            );
        }

        info!(
            families  = self.graph.family_count(),
            instances = self.graph.instance_count(),
            errors    = self.graph.error_count(),
            "Plugin graph built"
        );
        self.graph
    }

    // ─── Internals ───

    fn family_handle(&mut self, contract: &TypeRef) -> Option<TypeHandle> {
        match contract.resolve(self.graph.types()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.graph.log_mut().record(
                    ErrorCode::FamilyTypeNotFound,
                    format!("could not configure the plugin family: {err}"),
                    Some(contract.raw().to_string()),
                );
                None
            }
        }
    }

    fn apply_action(&mut self, contract: &TypeHandle, action: &FamilyAction) {
        let duplicates = self.options.duplicate_names;
        match action {
            FamilyAction::AddInstance(instance) | FamilyAction::UseDefault(instance) => {
                if !self.check_pluggable(contract, instance) {
                    return;
                }
                let family = self.graph.family_mut(contract);
                let outcome = match action {
                    FamilyAction::UseDefault(_) => family.use_default(instance.clone(), duplicates),
                    _ => family.add_instance(instance.clone(), duplicates),
                };
                if outcome == AddOutcome::Rejected {
                    self.graph.log_mut().record(
                        ErrorCode::DuplicateInstanceName,
                        format!(
                            "instance {} is already registered for '{contract}'",
                            instance.description()
                        ),
                        Some(contract.to_string()),
                    );
                }
            }
            FamilyAction::DefaultNamed(name) => {
                self.graph.family_mut(contract).set_default(name.clone());
                self.designations.push((contract.clone(), name.clone()));
            }
            FamilyAction::Lifecycle(memento) => {
                let mut created = None;
                self.with_system_object::<Arc<dyn LifecyclePolicy>>(memento, "lifecycle", |policy| {
                    created = Some(policy);
                });
                if let Some(policy) = created {
                    self.graph.family_mut(contract).set_lifecycle(policy);
                }
            }
            FamilyAction::Intercept(interceptor) => {
                if interceptor.contract() == contract.contract_id() {
                    self.graph
                        .family_mut(contract)
                        .add_interceptor(interceptor.clone());
                } else {
                    self.graph.log_mut().record(
                        ErrorCode::InterceptorMismatch,
                        format!(
                            "interceptor for '{}' cannot be attached to '{contract}'",
                            interceptor.contract()
                        ),
                        Some(contract.to_string()),
                    );
                }
            }
        }
    }

    /// Checks that `instance` can be plugged into `contract`, logging 131 for
    /// an unresolved concrete type or 104 otherwise.
    fn check_pluggable(&mut self, contract: &TypeHandle, instance: &Instance) -> bool {
        let pluggable = match instance.kind() {
            InstanceKind::Configured { concrete, .. } => {
                let mut resolved = None;
                self.with_type(concrete, "concrete type", |handle| resolved = Some(handle));
                let Some(concrete) = resolved else {
                    return false;
                };
                concrete.is_concrete() && concrete.can_plug(contract.contract_id())
            }
            _ => instance
                .can_plug(contract.contract_id(), self.graph.types())
                .unwrap_or(false),
        };

        if !pluggable {
            self.graph.log_mut().record(
                ErrorCode::CannotPlug,
                format!(
                    "instance {} cannot be plugged into '{contract}'",
                    instance.description()
                ),
                Some(contract.to_string()),
            );
        }
        pluggable
    }
}

/// Builds a graph from `sources` with default options.
///
/// Returns the graph together with the number of recorded errors.
pub fn build_graph(types: Arc<TypeRegistry>, sources: &[Registry]) -> (PluginGraph, usize) {
    build_graph_with(types, sources, BuilderOptions::default())
}

/// Builds a graph from `sources` with explicit options.
pub fn build_graph_with(
    types: Arc<TypeRegistry>,
    sources: &[Registry],
    options: BuilderOptions,
) -> (PluginGraph, usize) {
    let mut builder = GraphBuilder::with_options(types, options);
    for source in sources {
        builder.apply(source);
    }
    let graph = builder.build();
    let errors = graph.error_count();
    (graph, errors)
}
