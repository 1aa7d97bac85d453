//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{GraphConfig, JoineryConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &JoineryConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_graph_config(&config.graph)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(
            "Log filter module names cannot be empty",
        ));
    }

    Ok(())
}

fn validate_graph_config(graph: &GraphConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for assembly in &graph.assemblies {
        if assembly.trim().is_empty() {
            return Err(ConfigError::validation("Assembly names cannot be empty"));
        }
        if !seen.insert(assembly.as_str()) {
            return Err(ConfigError::DuplicateAssembly(assembly.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&JoineryConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = JoineryConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some("joinery.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_filter_module() {
        let mut config = JoineryConfig::default();
        config.logging.filters.insert(" ".into(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_duplicate_assembly() {
        let mut config = JoineryConfig::default();
        config.graph.assemblies = vec!["widgets".into(), "gadgets".into(), "widgets".into()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateAssembly(name)) if name == "widgets"
        ));
    }

    #[test]
    fn test_empty_assembly_name() {
        let mut config = JoineryConfig::default();
        config.graph.assemblies = vec![String::new()];
        assert!(validate_config(&config).is_err());
    }
}
