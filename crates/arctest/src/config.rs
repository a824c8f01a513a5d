//! Configuration document for architecture checks.
//!
//! Accepted as YAML (`.yml`/`.yaml`) or TOML (anything else). Keys are
//! camelCase in both formats:
//!
//! ```yaml
//! layers:
//!   - name: Domain
//!     pattern: "^domain$"
//!   - name: Application
//!     pattern: "^application$"
//! rules:
//!   - from: Application
//!     to: Domain
//! layerSpecificRules:
//!   - layer: Application
//!     ruleType: parameter
//!     parameters:
//!       structPattern: ".*Service"
//!       methodPattern: ".*"
//!       parameterTypePattern: ".*Logger"
//!       shouldUseInterface: true
//! ```

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Layer definitions, in resolution order.
    #[serde(default)]
    pub layers: Vec<LayerConfig>,

    /// Layer-to-layer allow rules for the whole-architecture check.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Interface implementation rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interface_rules: Vec<InterfaceRuleConfig>,

    /// Parameter shape rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_rules: Vec<ParameterRuleConfig>,

    /// Rules scoped to one layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer_specific_rules: Vec<LayerSpecificRuleConfig>,

    /// Explicit allow/deny rules between two layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub direct_layer_dependency_rules: Vec<DirectLayerDependencyRuleConfig>,

    /// Glob patterns (relative to the project root) of directories to skip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// A named layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Layer name.
    pub name: String,
    /// Package path pattern.
    pub pattern: String,
}

/// `from` may depend on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Source layer name.
    pub from: String,
    /// Target layer name.
    pub to: String,
}

/// Structs matching `struct_pattern` must implement an interface matching
/// `interface_pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRuleConfig {
    /// Struct name pattern.
    pub struct_pattern: String,
    /// Interface name pattern.
    pub interface_pattern: String,
}

/// Parameter shape rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRuleConfig {
    /// Struct name pattern.
    pub struct_pattern: String,
    /// Method name pattern.
    pub method_pattern: String,
    /// Parameter type pattern.
    pub parameter_type_pattern: String,
    /// Require interfaces (`true`) or structs (`false`).
    #[serde(default)]
    pub should_use_interface: bool,
}

/// Kind of a layer-specific rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRuleType {
    /// Deny imports matching `targetPattern`.
    Dependency,
    /// Interface implementation, scoped to the layer.
    Interface,
    /// Parameter shape, scoped to the layer.
    Parameter,
}

impl LayerRuleType {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dependency" => Some(Self::Dependency),
            "interface" => Some(Self::Interface),
            "parameter" => Some(Self::Parameter),
            _ => None,
        }
    }

    /// Parameter keys this rule type requires.
    #[must_use]
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::Dependency => &["targetPattern"],
            Self::Interface => &["structPattern", "interfacePattern"],
            Self::Parameter => &[
                "structPattern",
                "methodPattern",
                "parameterTypePattern",
                "shouldUseInterface",
            ],
        }
    }

    /// Keys whose values must compile as patterns.
    fn pattern_keys(self) -> &'static [&'static str] {
        match self {
            Self::Dependency => &["targetPattern"],
            Self::Interface => &["structPattern", "interfacePattern"],
            Self::Parameter => &["structPattern", "methodPattern", "parameterTypePattern"],
        }
    }
}

/// A scalar parameter value. Both `shouldUseInterface: true` and
/// `shouldUseInterface: "true"` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// String literal.
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A rule applied to one layer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpecificRuleConfig {
    /// Layer name.
    pub layer: String,
    /// `dependency`, `interface`, or `parameter`.
    pub rule_type: String,
    /// Rule parameters, keyed by camelCase name.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl LayerSpecificRuleConfig {
    /// Parsed rule type, if recognized.
    #[must_use]
    pub fn kind(&self) -> Option<LayerRuleType> {
        LayerRuleType::parse(&self.rule_type)
    }

    /// Parameter value as text; empty when absent.
    #[must_use]
    pub fn param(&self, key: &str) -> String {
        self.parameters
            .get(key)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Only the literal `true` enables interface parameters.
    #[must_use]
    pub fn should_use_interface(&self) -> bool {
        self.param("shouldUseInterface") == "true"
    }
}

/// Allow or deny `source_layer` -> `target_layer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectLayerDependencyRuleConfig {
    /// Source layer name.
    pub source_layer: String,
    /// Target layer name.
    pub target_layer: String,
    /// `true` adds an allow rule, `false` a deny rule.
    #[serde(default)]
    pub allowed: bool,
}

/// Errors when loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML/TOML for this schema.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },

    /// The document parsed but references something invalid.
    #[error("{context}: {message}")]
    Validation {
        /// Offending section and index (e.g. `interface rule 0`).
        context: String,
        /// What is wrong.
        message: String,
    },

    /// Source extraction failed.
    #[error("failed to parse packages: {0}")]
    Extraction(#[from] arctest_go::ExtractionError),

    /// A rule could not be constructed.
    #[error("{context}: {source}")]
    Build {
        /// Which rule failed.
        context: String,
        /// Underlying rule error.
        #[source]
        source: arctest_core::RuleError,
    },
}

impl ConfigError {
    fn validation(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML document.
    Yaml,
    /// TOML document.
    Toml,
}

impl Format {
    /// `.yml`/`.yaml` is YAML; everything else is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml" | "yaml") => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

impl Config {
    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::parse(&content, Format::from_path(path))?;
        tracing::debug!(
            path = %path.display(),
            layers = config.layers.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn parse(content: &str, format: Format) -> Result<Self, ConfigError> {
        let config: Self = match format {
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            })?,
            Format::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Yaml)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Toml)
    }

    /// Serializes to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Writes the config as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Starter config for a conventional four-layer project.
    #[must_use]
    pub fn starter() -> Self {
        let layer = |name: &str, pattern: &str| LayerConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
        };
        let rule = |from: &str, to: &str| RuleConfig {
            from: from.to_string(),
            to: to.to_string(),
        };
        Self {
            layers: vec![
                layer("Domain", "^domain$"),
                layer("Application", "^application$"),
                layer("Infrastructure", "^infrastructure$"),
                layer("Presentation", "^presentation$"),
            ],
            rules: vec![
                rule("Application", "Domain"),
                rule("Infrastructure", "Domain"),
                rule("Presentation", "Application"),
                rule("Presentation", "Domain"),
            ],
            interface_rules: vec![InterfaceRuleConfig {
                struct_pattern: ".*Repository$".to_string(),
                interface_pattern: ".*RepositoryInterface$".to_string(),
            }],
            ..Self::default()
        }
    }

    /// Checks the document before anything is built. The first problem
    /// found is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::validation(
                "configuration",
                "no layers defined",
            ));
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if layer.name.is_empty() {
                return Err(ConfigError::validation("layer", "name cannot be empty"));
            }
            let context = format!("layer {}", layer.name);
            if layer.pattern.is_empty() {
                return Err(ConfigError::validation(context, "pattern cannot be empty"));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(ConfigError::validation(context, "duplicate layer name"));
            }
            check_pattern(&context, "pattern", &layer.pattern)?;
        }

        let known = |name: &str| names.contains(name);

        for (i, rule) in self.rules.iter().enumerate() {
            let context = format!("rule {i}");
            for (slot, name) in [("from", &rule.from), ("to", &rule.to)] {
                if name.is_empty() {
                    return Err(ConfigError::validation(
                        context,
                        format!("'{slot}' cannot be empty"),
                    ));
                }
                if !known(name.as_str()) {
                    return Err(ConfigError::validation(
                        context,
                        format!("references undefined layer: {name}"),
                    ));
                }
            }
        }

        for (i, rule) in self.interface_rules.iter().enumerate() {
            let context = format!("interface rule {i}");
            check_required_pattern(&context, "struct", &rule.struct_pattern)?;
            check_required_pattern(&context, "interface", &rule.interface_pattern)?;
        }

        for (i, rule) in self.parameter_rules.iter().enumerate() {
            let context = format!("parameter rule {i}");
            check_required_pattern(&context, "struct", &rule.struct_pattern)?;
            check_required_pattern(&context, "method", &rule.method_pattern)?;
            check_required_pattern(&context, "parameter type", &rule.parameter_type_pattern)?;
        }

        for (i, rule) in self.layer_specific_rules.iter().enumerate() {
            let context = format!("layer-specific rule {i}");
            if rule.layer.is_empty() {
                return Err(ConfigError::validation(context, "layer cannot be empty"));
            }
            if !known(rule.layer.as_str()) {
                return Err(ConfigError::validation(
                    context,
                    format!("references undefined layer: {}", rule.layer),
                ));
            }
            if rule.rule_type.is_empty() {
                return Err(ConfigError::validation(context, "rule type cannot be empty"));
            }
            let Some(kind) = rule.kind() else {
                return Err(ConfigError::validation(
                    context,
                    format!("invalid rule type: {}", rule.rule_type),
                ));
            };
            if rule.parameters.is_empty() {
                return Err(ConfigError::validation(context, "parameters cannot be empty"));
            }
            for key in kind.required_keys() {
                if !rule.parameters.contains_key(*key) {
                    return Err(ConfigError::validation(
                        context,
                        format!("{} rule requires '{key}' parameter", rule.rule_type),
                    ));
                }
            }
            for key in kind.pattern_keys() {
                check_pattern(&context, key, &rule.param(key))?;
            }
        }

        for (i, rule) in self.direct_layer_dependency_rules.iter().enumerate() {
            let context = format!("direct layer dependency rule {i}");
            for (slot, name) in [("source", &rule.source_layer), ("target", &rule.target_layer)] {
                if name.is_empty() {
                    return Err(ConfigError::validation(
                        context,
                        format!("{slot} layer cannot be empty"),
                    ));
                }
                if !known(name.as_str()) {
                    return Err(ConfigError::validation(
                        context,
                        format!("references undefined {slot} layer: {name}"),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn check_pattern(context: &str, what: &str, pattern: &str) -> Result<(), ConfigError> {
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::validation(context, format!("invalid {what}: {e}")))
}

fn check_required_pattern(context: &str, what: &str, pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::validation(
            context,
            format!("{what} pattern cannot be empty"),
        ));
    }
    check_pattern(context, &format!("{what} pattern"), pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
layers:
  - name: Domain
    pattern: "^domain$"
  - name: Application
    pattern: "^application$"
rules:
  - from: Application
    to: Domain
interfaceRules:
  - structPattern: ".*Repository$"
    interfacePattern: ".*RepositoryInterface$"
layerSpecificRules:
  - layer: Application
    ruleType: parameter
    parameters:
      structPattern: ".*Service"
      methodPattern: ".*"
      parameterTypePattern: ".*Logger"
      shouldUseInterface: true
directLayerDependencyRules:
  - sourceLayer: Domain
    targetLayer: Application
    allowed: false
"#;

    fn validation_error(config: &Config) -> String {
        match config.validate() {
            Err(e @ ConfigError::Validation { .. }) => e.to_string(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_yaml_document() {
        let config = Config::parse_yaml(YAML).unwrap();
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.rules[0].from, "Application");
        assert_eq!(config.interface_rules.len(), 1);
        let specific = &config.layer_specific_rules[0];
        assert_eq!(specific.kind(), Some(LayerRuleType::Parameter));
        assert!(specific.should_use_interface());
        assert!(!config.direct_layer_dependency_rules[0].allowed);
    }

    #[test]
    fn parses_toml_document() {
        let config = Config::parse_toml(
            r#"
exclude = ["gen/**"]

[[layers]]
name = "Domain"
pattern = "domain"

[[layerSpecificRules]]
layer = "Domain"
ruleType = "dependency"
parameters = { targetPattern = "utils" }
"#,
        )
        .unwrap();
        assert_eq!(config.exclude, vec!["gen/**"]);
        assert_eq!(config.layer_specific_rules[0].param("targetPattern"), "utils");
    }

    #[test]
    fn string_true_enables_interface_parameters() {
        let mut rule = LayerSpecificRuleConfig {
            layer: "Domain".into(),
            rule_type: "parameter".into(),
            parameters: BTreeMap::new(),
        };
        rule.parameters
            .insert("shouldUseInterface".into(), ParamValue::from("true"));
        assert!(rule.should_use_interface());
        rule.parameters
            .insert("shouldUseInterface".into(), ParamValue::from("yes"));
        assert!(!rule.should_use_interface());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new(".arctest.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("arctest.toml")), Format::Toml);
    }

    #[test]
    fn requires_layers() {
        insta::assert_snapshot!(
            validation_error(&Config::default()),
            @"configuration: no layers defined"
        );
    }

    #[test]
    fn rejects_duplicate_layer() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.layers.push(config.layers[0].clone());
        insta::assert_snapshot!(validation_error(&config), @"layer Domain: duplicate layer name");
    }

    #[test]
    fn rejects_undefined_layer_reference() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.rules[0].to = "Persistence".into();
        insta::assert_snapshot!(
            validation_error(&config),
            @"rule 0: references undefined layer: Persistence"
        );
    }

    #[test]
    fn rejects_missing_layer_specific_key() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.layer_specific_rules[0]
            .parameters
            .remove("methodPattern");
        insta::assert_snapshot!(
            validation_error(&config),
            @"layer-specific rule 0: parameter rule requires 'methodPattern' parameter"
        );
    }

    #[test]
    fn rejects_unknown_rule_type() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.layer_specific_rules[0].rule_type = "naming".into();
        insta::assert_snapshot!(
            validation_error(&config),
            @"layer-specific rule 0: invalid rule type: naming"
        );
    }

    #[test]
    fn rejects_invalid_regex() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.interface_rules[0].struct_pattern = "(".into();
        assert!(validation_error(&config).starts_with("interface rule 0: invalid struct pattern"));
    }

    #[test]
    fn rejects_undefined_direct_target() {
        let mut config = Config::parse_yaml(YAML).unwrap();
        config.direct_layer_dependency_rules[0].target_layer = "Nope".into();
        insta::assert_snapshot!(
            validation_error(&config),
            @"direct layer dependency rule 0: references undefined target layer: Nope"
        );
    }

    #[test]
    fn parse_rejects_invalid_documents() {
        assert!(matches!(
            Config::parse_yaml("layers: [oops"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::parse_yaml("layers: []"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn starter_round_trips_through_yaml() {
        let starter = Config::starter();
        starter.validate().unwrap();
        let yaml = starter.to_yaml().unwrap();
        assert_eq!(Config::parse_yaml(&yaml).unwrap(), starter);
    }
}
