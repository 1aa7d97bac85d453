//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use joinery_core::{DefaultSelection, DuplicateNames};
use joinery_framework::{BuilderOptions, ContainerOptions};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoineryConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Graph building settings.
    #[serde(default)]
    pub graph: GraphConfig,

    /// Container settings.
    #[serde(default)]
    pub container: ContainerConfig,
}

// =============================================================================
// Graph and Container
// =============================================================================

/// Graph building settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Handling of instance names registered twice in one family.
    #[serde(default)]
    pub duplicate_names: DuplicateNames,

    /// Refuse to create a container when the error log is not empty.
    #[serde(default)]
    pub strict: bool,

    /// Assemblies the configuration requires, added before any source.
    #[serde(default)]
    pub assemblies: Vec<String>,
}

impl GraphConfig {
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            duplicate_names: self.duplicate_names,
        }
    }
}

/// Container settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// How a family without a designated default picks one.
    #[serde(default)]
    pub default_selection: DefaultSelection,
}

impl From<ContainerConfig> for ContainerOptions {
    fn from(config: ContainerConfig) -> Self {
        Self {
            default_selection: config.default_selection,
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level.
    pub level: LogLevel,

    /// Output format.
    pub format: LogFormat,

    /// Output destination.
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `joinery_framework = "debug"`.
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids in log lines.
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    pub file_location: bool,

    /// Span lifecycle events.
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JoineryConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.graph.duplicate_names, DuplicateNames::Replace);
        assert!(!config.graph.strict);
        assert_eq!(config.container.default_selection, DefaultSelection::SoleInstance);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: JoineryConfig = serde_json::from_str(
            r#"{
                "logging": { "level": "debug", "filters": { "joinery_core": "trace" } },
                "graph": { "duplicate_names": "reject", "strict": true, "assemblies": ["widgets"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filters["joinery_core"], LogLevel::Trace);
        assert_eq!(config.graph.builder_options().duplicate_names, DuplicateNames::Reject);
        assert!(config.graph.strict);
        assert_eq!(config.graph.assemblies, vec!["widgets"]);
        assert_eq!(ContainerOptions::from(config.container), ContainerOptions::default());
    }
}
