//! Start-up orchestration: configuration → logging → graph → container.
//!
//! ```rust,ignore
//! use joinery_runtime::Bootstrap;
//!
//! let container = Bootstrap::linked()
//!     .source(registry)
//!     .build()?;
//! let service = container.get::<dyn ColorService>()?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use joinery_core::{SystemRegistry, TypeRegistry};
use joinery_framework::{Container, GraphBuilder, Registry};

use crate::config::{ConfigLoader, JoineryConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Assembles a [`Container`] from a type registry, registration sources and
/// layered configuration.
///
/// Assemblies listed under `graph.assemblies` are added before any source is
/// applied.  In strict mode (`graph.strict`) a non-empty error log fails the
/// build; otherwise the report is logged at `WARN` and the container is
/// created anyway.
pub struct Bootstrap {
    types: Arc<TypeRegistry>,
    sources: Vec<Registry>,
    loader: ConfigLoader,
    config: Option<JoineryConfig>,
    systems: Option<SystemRegistry>,
    init_logging: bool,
}

impl Bootstrap {
    pub fn new(types: impl Into<Arc<TypeRegistry>>) -> Self {
        Self {
            types: types.into(),
            sources: Vec::new(),
            loader: ConfigLoader::new(),
            config: None,
            systems: None,
            init_logging: false,
        }
    }

    /// Bootstraps from every assembly contributed at link time.
    pub fn linked() -> Self {
        Self::new(TypeRegistry::linked())
    }

    /// Adds a registration source.  Sources are applied in insertion order.
    pub fn source(mut self, registry: Registry) -> Self {
        self.sources.push(registry);
        self
    }

    pub fn sources(mut self, registries: impl IntoIterator<Item = Registry>) -> Self {
        self.sources.extend(registries);
        self
    }

    /// Uses `config` as is, skipping file and environment loading.
    pub fn config(mut self, config: JoineryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads configuration from `path` (plus environment variables).
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Replaces the configuration loader.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Replaces the built-in system object registry.
    pub fn systems(mut self, systems: SystemRegistry) -> Self {
        self.systems = Some(systems);
        self
    }

    /// Installs a global subscriber from the logging section before building.
    pub fn with_logging(mut self) -> Self {
        self.init_logging = true;
        self
    }

    pub fn build(self) -> RuntimeResult<Container> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let systems = self.systems.unwrap_or_else(SystemRegistry::with_defaults);
        let mut builder =
            GraphBuilder::with_systems(self.types, systems, config.graph.builder_options());
        for assembly in &config.graph.assemblies {
            builder.add_assembly(assembly);
        }
        for source in &self.sources {
            builder.apply(source);
        }
        let graph = builder.build();

        let count = graph.error_count();
        if count > 0 {
            let report = graph.log().report();
            if config.graph.strict {
                return Err(RuntimeError::Configuration { count, report });
            }
            warn!(errors = count, "{report}");
        }

        let container = Container::with_options(graph, config.container.into());
        info!(sources = self.sources.len(), "Container ready: {}", container.stats());
        let assemblies: Vec<_> = container.graph().assemblies().collect();
        debug!(?assemblies, "Scanned assemblies");
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::{BuildResult, DefaultSelection, ErrorCode, Instance, PropertyReader};

    trait Widget: Send + Sync {
        fn label(&self) -> String;
    }

    struct Gear {
        teeth: u32,
    }

    impl Widget for Gear {
        fn label(&self) -> String {
            format!("gear with {} teeth", self.teeth)
        }
    }

    fn build_gear(props: &mut PropertyReader<'_>) -> BuildResult<Gear> {
        Ok(Gear {
            teeth: props.value("teeth")?,
        })
    }

    fn types() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.assembly("widgets", |asm| {
            asm.contract::<dyn Widget>("Widget");
            asm.concrete_with("Gear", build_gear).plugs::<dyn Widget>(|g| g);
        });
        types
    }

    fn gears() -> Registry {
        let mut registry = Registry::new();
        registry
            .for_type::<dyn Widget>()
            .add(Instance::configured("Gear").named("small").with_literal("teeth", 12))
            .add(Instance::configured("Gear").named("large").with_literal("teeth", 48));
        registry
    }

    #[test]
    fn test_build_from_sources() -> anyhow::Result<()> {
        let container = Bootstrap::new(types())
            .config(JoineryConfig::default())
            .source(gears())
            .build()?;

        let large = container.get_named::<dyn Widget>("large")?;
        assert_eq!(large.label(), "gear with 48 teeth");
        assert_eq!(container.stats().errors, 0);
        Ok(())
    }

    #[test]
    fn test_configured_assemblies() {
        let mut config = JoineryConfig::default();
        config.graph.assemblies = vec!["widgets".into(), "missing".into()];

        let container = Bootstrap::new(types()).config(config).build().unwrap();
        assert!(container.graph().has_assembly("widgets"));
        assert!(container.graph().log().has_error(ErrorCode::AssemblyNotFound));
    }

    #[test]
    fn test_strict_mode_fails_on_errors() {
        let mut config = JoineryConfig::default();
        config.graph.strict = true;

        let mut broken = Registry::new();
        broken.for_contract("Nope").add(Instance::configured("Gear"));

        let result = Bootstrap::new(types()).config(config).source(broken).build();
        match result {
            Err(RuntimeError::Configuration { count, report }) => {
                assert_eq!(count, 1);
                assert!(report.contains("Error 103"));
            }
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_lenient_mode_keeps_going() {
        let mut broken = Registry::new();
        broken.for_contract("Nope").add(Instance::configured("Gear"));

        let container = Bootstrap::new(types())
            .config(JoineryConfig::default())
            .sources([broken, gears()])
            .build()
            .unwrap();
        assert_eq!(container.stats().errors, 1);
        assert!(container.get_named::<dyn Widget>("small").is_ok());
    }

    #[test]
    fn test_container_options_from_config() -> anyhow::Result<()> {
        let mut config = JoineryConfig::default();
        config.container.default_selection = DefaultSelection::FirstRegistered;

        let container = Bootstrap::new(types()).config(config).source(gears()).build()?;
        assert_eq!(container.get::<dyn Widget>()?.label(), "gear with 12 teeth");
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = JoineryConfig::default();
        config.graph.assemblies = vec!["widgets".into(), "widgets".into()];

        let result = Bootstrap::new(types()).config(config).build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
