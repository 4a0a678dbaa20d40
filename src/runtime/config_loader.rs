//! Binding configuration loader.
//!
//! Loads the function definition and channel bindings from YAML. Binding names
//! follow the binder convention `<function>-in-<n>` / `<function>-out-<n>`.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Environment variable overriding the `definition` entry.
pub const DEFINITION_ENV: &str = "ISTAD_FUNCTION_DEFINITION";

/// Function definition plus channel bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// `;`-separated list of active function names
    #[serde(default)]
    pub definition: String,

    /// Binding name -> binding
    #[serde(default)]
    pub bindings: IndexMap<String, BindingDef>,
}

/// One channel binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingDef {
    /// Topic the binding reads from or writes to
    pub destination: String,

    /// Consumer group (inbound bindings only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl BindingDef {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            group: None,
            content_type: None,
        }
    }
}

/// Binding name for the first inbound channel of `function`.
pub fn inbound_binding_name(function: &str) -> String {
    format!("{}-in-0", function)
}

/// Binding name for the first outbound channel of `function`.
pub fn outbound_binding_name(function: &str) -> String {
    format!("{}-out-0", function)
}

impl BindingConfig {
    /// Load binding configuration from a YAML file.
    ///
    /// `ISTAD_FUNCTION_DEFINITION`, when set, replaces the file's `definition`.
    ///
    /// # Example
    /// ```ignore
    /// use istad_stream::runtime::BindingConfig;
    ///
    /// let config = BindingConfig::load_from_file("config/bindings.yaml")?;
    /// println!("Functions: {:?}", config.function_names());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| {
            StreamError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        config.apply_definition_override(std::env::var(DEFINITION_ENV).ok());

        tracing::debug!(
            "Loaded binding config from {} ({} bindings)",
            path.display(),
            config.bindings.len()
        );

        Ok(config)
    }

    /// Parse binding configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, StreamError> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Replace `definition` when an override is present and non-blank.
    pub fn apply_definition_override(&mut self, definition: Option<String>) {
        if let Some(definition) = definition.filter(|d| !d.trim().is_empty()) {
            tracing::info!("Function definition overridden: {}", definition);
            self.definition = definition;
        }
    }

    /// Active function names in definition order, empty entries dropped.
    pub fn function_names(&self) -> Vec<&str> {
        self.definition
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn inbound(&self, function: &str) -> Option<&BindingDef> {
        self.bindings.get(&inbound_binding_name(function))
    }

    pub fn outbound(&self, function: &str) -> Option<&BindingDef> {
        self.bindings.get(&outbound_binding_name(function))
    }

    /// Builder-style helper for programmatic configs.
    pub fn with_binding(mut self, name: impl Into<String>, binding: BindingDef) -> Self {
        self.bindings.insert(name.into(), binding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BINDINGS_YAML: &str = r#"
definition: processOracleMessage; processProductDetail;;
bindings:
  processOracleMessage-in-0:
    destination: oracle.records
    group: istad
  processProductDetail-in-0:
    destination: product.details
    content-type: application/json
  processProductDetail-out-0:
    destination: product.recoded
"#;

    #[test]
    fn test_parse_yaml() {
        let config = BindingConfig::from_yaml_str(BINDINGS_YAML).unwrap();

        assert_eq!(
            config.function_names(),
            vec!["processOracleMessage", "processProductDetail"]
        );
        assert_eq!(config.bindings.len(), 3);

        let inbound = config.inbound("processOracleMessage").unwrap();
        assert_eq!(inbound.destination, "oracle.records");
        assert_eq!(inbound.group.as_deref(), Some("istad"));

        let details = config.inbound("processProductDetail").unwrap();
        assert_eq!(details.content_type.as_deref(), Some("application/json"));

        assert_eq!(
            config.outbound("processProductDetail").map(|b| b.destination.as_str()),
            Some("product.recoded")
        );
        assert!(config.outbound("processOracleMessage").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BINDINGS_YAML.as_bytes()).unwrap();

        let config = BindingConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.bindings.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = BindingConfig::load_from_file("/nonexistent/bindings.yaml");
        assert!(matches!(result, Err(StreamError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = BindingConfig::from_yaml_str("bindings: [not, a, map");
        assert!(matches!(result, Err(StreamError::Config(_))));
    }

    #[test]
    fn test_definition_override() {
        let mut config = BindingConfig::from_yaml_str(BINDINGS_YAML).unwrap();

        config.apply_definition_override(Some("  ".to_string()));
        assert_eq!(config.function_names().len(), 2);

        config.apply_definition_override(Some("processMessage".to_string()));
        assert_eq!(config.function_names(), vec!["processMessage"]);
    }

    #[test]
    fn test_binding_names() {
        assert_eq!(inbound_binding_name("processProduct"), "processProduct-in-0");
        assert_eq!(outbound_binding_name("processProduct"), "processProduct-out-0");
    }
}
