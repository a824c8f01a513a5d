//! Builds an architecture from configuration and runs every engine.

use std::collections::HashMap;
use std::path::Path;

use arctest_core::{
    Architecture, CheckReport, DependencyRule, InterfaceImplementationRule, Layer,
    LayeredArchitecture, ParameterRule, RuleError,
};
use arctest_go::{PackageLoader, ParsePackages};
use tracing::{debug, info};

use crate::config::{Config, ConfigError, LayerRuleType, LayerSpecificRuleConfig};

/// Everything a config produces: the parsed model, the bound layered
/// architecture, and the three rule collections.
#[derive(Debug)]
pub struct BuiltArchitecture {
    /// Extracted model.
    pub architecture: Architecture,
    /// Layers with their synthesized allow rules.
    pub layered: LayeredArchitecture,
    /// Deny rules from layer-specific and direct layer rules.
    pub dependency_rules: Vec<DependencyRule>,
    /// Interface rules, global then layer-scoped.
    pub interface_rules: Vec<InterfaceImplementationRule>,
    /// Parameter rules, global then layer-scoped.
    pub parameter_rules: Vec<ParameterRule>,
}

impl BuiltArchitecture {
    /// Runs the layered check, then the dependency, interface, and
    /// parameter engines, concatenating violations in that order.
    #[must_use]
    pub fn check(&self) -> CheckReport {
        let arch = &self.architecture;
        let mut report = CheckReport::new();

        let layered = self.layered.check(arch);
        debug!(violations = layered.len(), "layered check");
        report.extend(layered);

        let dependencies = arch.check_dependencies(&self.dependency_rules);
        debug!(
            rules = self.dependency_rules.len(),
            violations = dependencies.len(),
            "dependency rules"
        );
        report.extend(dependencies);

        let interfaces = arch.check_interface_implementations(&self.interface_rules);
        debug!(
            rules = self.interface_rules.len(),
            violations = interfaces.len(),
            "interface rules"
        );
        report.extend(interfaces);

        let parameters = arch.check_method_parameters(&self.parameter_rules);
        debug!(
            rules = self.parameter_rules.len(),
            violations = parameters.len(),
            "parameter rules"
        );
        report.extend(parameters);

        info!(violations = report.len(), "architecture check finished");
        report
    }
}

fn build_err(context: impl Into<String>) -> impl FnOnce(RuleError) -> ConfigError {
    let context = context.into();
    move |source| ConfigError::Build { context, source }
}

impl Config {
    /// Parses the project at `root` and builds layers and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, extraction, or rule construction
    /// fails.
    pub fn build_architecture(&self, root: &Path) -> Result<BuiltArchitecture, ConfigError> {
        self.validate()?;

        let mut architecture = Architecture::new(root);
        let loader = PackageLoader::new(root).excludes(&self.exclude)?;
        architecture.parse_with(&loader)?;

        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            layers.push(
                Layer::new(layer.name.as_str(), [layer.pattern.as_str()])
                    .map_err(build_err(format!("layer {}", layer.name)))?,
            );
        }
        let mut layered = architecture.new_layered_architecture(layers);

        for rule in &self.rules {
            layered
                .add_rule(&rule.from, &rule.to)
                .map_err(build_err(format!("rule {} -> {}", rule.from, rule.to)))?;
        }

        let mut dependency_rules = Vec::new();
        let mut interface_rules = Vec::new();
        let mut parameter_rules = Vec::new();

        for rule in &self.interface_rules {
            interface_rules.push(
                architecture
                    .structs_implement_interfaces(&rule.struct_pattern, &rule.interface_pattern)
                    .map_err(build_err("interface rule"))?,
            );
        }

        for rule in &self.parameter_rules {
            let built = if rule.should_use_interface {
                architecture.methods_should_use_interface_parameters(
                    &rule.struct_pattern,
                    &rule.method_pattern,
                    &rule.parameter_type_pattern,
                )
            } else {
                architecture.methods_should_use_struct_parameters(
                    &rule.struct_pattern,
                    &rule.method_pattern,
                    &rule.parameter_type_pattern,
                )
            };
            parameter_rules.push(built.map_err(build_err("parameter rule"))?);
        }

        let by_name: HashMap<&str, &Layer> =
            layered.layers().iter().map(|l| (l.name(), l)).collect();

        for (i, rule) in self.layer_specific_rules.iter().enumerate() {
            let context = format!("layer-specific rule {i}");
            let layer = by_name.get(rule.layer.as_str()).ok_or_else(|| {
                ConfigError::Build {
                    context: context.clone(),
                    source: RuleError::UnknownLayer {
                        role: "rule",
                        name: rule.layer.clone(),
                    },
                }
            })?;
            add_layer_specific(
                layer,
                rule,
                &mut dependency_rules,
                &mut interface_rules,
                &mut parameter_rules,
            )
            .map_err(build_err(context))?;
        }

        let mut allowed = Vec::new();
        for (i, rule) in self.direct_layer_dependency_rules.iter().enumerate() {
            if rule.allowed {
                allowed.push((i, rule));
                continue;
            }
            let lookup = |name: &str, role: &'static str| {
                by_name.get(name).copied().ok_or_else(|| RuleError::UnknownLayer {
                    role,
                    name: name.to_string(),
                })
            };
            let context = format!("direct layer dependency rule {i}");
            let source = lookup(rule.source_layer.as_str(), "source")
                .map_err(build_err(context.clone()))?;
            let target = lookup(rule.target_layer.as_str(), "target")
                .map_err(build_err(context.clone()))?;
            dependency_rules.extend(
                source
                    .does_not_depend_on_layer(target)
                    .map_err(build_err(context))?,
            );
        }

        for (i, rule) in allowed {
            layered
                .add_rule(&rule.source_layer, &rule.target_layer)
                .map_err(build_err(format!("direct layer dependency rule {i}")))?;
        }

        info!(
            packages = architecture.packages().len(),
            layers = layered.layers().len(),
            allow_rules = layered.rules().len(),
            dependency_rules = dependency_rules.len(),
            interface_rules = interface_rules.len(),
            parameter_rules = parameter_rules.len(),
            "built architecture"
        );

        Ok(BuiltArchitecture {
            architecture,
            layered,
            dependency_rules,
            interface_rules,
            parameter_rules,
        })
    }

    /// Builds the architecture for `root` and runs every check.
    ///
    /// # Errors
    ///
    /// See [`build_architecture`](Self::build_architecture).
    pub fn run_architecture_tests(&self, root: &Path) -> Result<CheckReport, ConfigError> {
        Ok(self.build_architecture(root)?.check())
    }
}

fn add_layer_specific(
    layer: &Layer,
    rule: &LayerSpecificRuleConfig,
    dependency_rules: &mut Vec<DependencyRule>,
    interface_rules: &mut Vec<InterfaceImplementationRule>,
    parameter_rules: &mut Vec<ParameterRule>,
) -> Result<(), RuleError> {
    let Some(kind) = rule.kind() else {
        return Ok(());
    };
    match kind {
        LayerRuleType::Dependency => {
            dependency_rules.push(layer.does_not_depend_on(&rule.param("targetPattern"))?);
        }
        LayerRuleType::Interface => {
            interface_rules.push(layer.structs_implement_interfaces(
                &rule.param("structPattern"),
                &rule.param("interfacePattern"),
            )?);
        }
        LayerRuleType::Parameter => {
            let (s, m, p) = (
                rule.param("structPattern"),
                rule.param("methodPattern"),
                rule.param("parameterTypePattern"),
            );
            parameter_rules.push(if rule.should_use_interface() {
                layer.methods_should_use_interface_parameters(&s, &m, &p)?
            } else {
                layer.methods_should_use_struct_parameters(&s, &m, &p)?
            });
        }
    }
    Ok(())
}
