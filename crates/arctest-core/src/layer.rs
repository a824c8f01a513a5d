//! Layers and whole-architecture layering checks.
//!
//! A [`Layer`] groups packages by path patterns. Layer patterns are always
//! evaluated through their fragment form (see [`crate::fragment`]), so a
//! layer declared as `domain` also owns `domain/entities` and any import
//! path ending in `/domain`, but never `mydomain`.

use std::path::PathBuf;

use crate::dependency::DependencyRule;
use crate::error::RuleError;
use crate::interfaces::InterfaceImplementationRule;
use crate::model::Architecture;
use crate::parameters::ParameterRule;
use crate::pattern::{fragment, Pattern};

/// A named group of packages.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    patterns: Vec<String>,
    membership: Vec<Pattern>,
    architecture: Option<PathBuf>,
}

impl Layer {
    /// Creates a layer from one or more path patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to compile.
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut membership = Vec::with_capacity(patterns.len());
        for raw in &patterns {
            Pattern::new(raw)
                .map_err(|e| RuleError::pattern(&format!("layer `{name}` pattern"), e))?;
            let suffix = Pattern::new(&fragment::suffix_expression(raw))
                .map_err(|e| RuleError::pattern(&format!("layer `{name}` pattern"), e))?;
            membership.push(suffix);
        }

        Ok(Self {
            name,
            patterns,
            membership,
            architecture: None,
        })
    }

    /// Layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw patterns as declared.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Associates the layer with an architecture, enabling the layer-scoped
    /// rule constructors.
    pub fn bind(&mut self, arch: &Architecture) {
        self.architecture = Some(arch.root().to_path_buf());
    }

    /// Whether [`bind`](Self::bind) has been called.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.architecture.is_some()
    }

    /// Whether a package or import path belongs to this layer.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.membership.iter().any(|p| p.matches(path))
    }

    /// Declares that this layer may depend on the layer named `target`.
    ///
    /// # Errors
    ///
    /// See [`LayeredArchitecture::add_rule`].
    pub fn depends_on(
        &self,
        target: &str,
        layered: &mut LayeredArchitecture,
    ) -> Result<(), RuleError> {
        layered.add_rule(&self.name, target)
    }

    /// Declares that this layer may depend on `target`.
    ///
    /// # Errors
    ///
    /// See [`LayeredArchitecture::add_rule`].
    pub fn depends_on_layer(
        &self,
        target: &Layer,
        layered: &mut LayeredArchitecture,
    ) -> Result<(), RuleError> {
        layered.add_rule(&self.name, &target.name)
    }

    /// Forbids packages of this layer (and nested packages) from importing
    /// paths matching `target_pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unbound or the pattern is invalid.
    pub fn does_not_depend_on(&self, target_pattern: &str) -> Result<DependencyRule, RuleError> {
        self.ensure_bound()?;
        DependencyRule::new(
            &fragment::any_suffix_expression(&self.patterns),
            target_pattern,
            false,
        )
    }

    /// Forbids packages of this layer from importing packages of `target`.
    ///
    /// One deny rule per `(source pattern, target pattern)` pair, mirroring
    /// [`LayeredArchitecture::add_rule`].
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unbound.
    pub fn does_not_depend_on_layer(
        &self,
        target: &Layer,
    ) -> Result<Vec<DependencyRule>, RuleError> {
        self.ensure_bound()?;
        pairwise_rules(&self.patterns, &target.patterns, false)
    }

    /// Interface implementation rule restricted to structs of this layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unbound or a pattern is invalid.
    pub fn structs_implement_interfaces(
        &self,
        struct_pattern: &str,
        interface_pattern: &str,
    ) -> Result<InterfaceImplementationRule, RuleError> {
        self.ensure_bound()?;
        let scoped = self.scoped_pattern(struct_pattern);
        let rule = InterfaceImplementationRule::new(&scoped, interface_pattern)?;
        Ok(rule.with_qualified_names())
    }

    /// Parameter rule requiring interfaces, restricted to this layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unbound or a pattern is invalid.
    pub fn methods_should_use_interface_parameters(
        &self,
        struct_pattern: &str,
        method_pattern: &str,
        parameter_type_pattern: &str,
    ) -> Result<ParameterRule, RuleError> {
        self.ensure_bound()?;
        Ok(ParameterRule::new(
            &self.scoped_pattern(struct_pattern),
            method_pattern,
            parameter_type_pattern,
            true,
        )?
        .with_qualified_names())
    }

    /// Parameter rule requiring structs, restricted to this layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unbound or a pattern is invalid.
    pub fn methods_should_use_struct_parameters(
        &self,
        struct_pattern: &str,
        method_pattern: &str,
        parameter_type_pattern: &str,
    ) -> Result<ParameterRule, RuleError> {
        self.ensure_bound()?;
        Ok(ParameterRule::new(
            &self.scoped_pattern(struct_pattern),
            method_pattern,
            parameter_type_pattern,
            false,
        )?
        .with_qualified_names())
    }

    /// Rewrites a struct pattern so it only matches structs of this layer.
    #[must_use]
    pub fn scoped_pattern(&self, pattern: &str) -> String {
        fragment::scoped_struct_expression(&self.patterns, pattern)
    }

    fn ensure_bound(&self) -> Result<(), RuleError> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(RuleError::Unbound {
                layer: self.name.clone(),
            })
        }
    }
}

/// Ordered layers plus the allow rules synthesized between them.
#[derive(Debug, Clone, Default)]
pub struct LayeredArchitecture {
    layers: Vec<Layer>,
    rules: Vec<DependencyRule>,
    architecture: Option<PathBuf>,
}

impl LayeredArchitecture {
    /// Creates a layered architecture. Layer order decides first-match
    /// resolution.
    #[must_use]
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            rules: Vec::new(),
            architecture: None,
        }
    }

    /// Binds this layered architecture and every layer to `arch`.
    pub fn bind(&mut self, arch: &Architecture) {
        self.architecture = Some(arch.root().to_path_buf());
        for layer in &mut self.layers {
            layer.bind(arch);
        }
    }

    /// Whether [`bind`](Self::bind) has been called.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.architecture.is_some()
    }

    /// Layers in declaration order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Dependency rules declared so far.
    #[must_use]
    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }

    /// First layer with the given name.
    #[must_use]
    pub fn where_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Allows layer `source` to depend on layer `target`.
    ///
    /// Synthesizes one allow rule per `(source pattern, target pattern)`
    /// pair, each in suffix form so nested packages are covered.
    ///
    /// # Errors
    ///
    /// Returns an error if either layer is undefined.
    pub fn add_rule(&mut self, source: &str, target: &str) -> Result<(), RuleError> {
        let source_layer = self
            .where_layer(source)
            .ok_or_else(|| RuleError::UnknownLayer {
                role: "source",
                name: source.to_string(),
            })?;
        let target_layer = self
            .where_layer(target)
            .ok_or_else(|| RuleError::UnknownLayer {
                role: "target",
                name: target.to_string(),
            })?;

        let synthesized = pairwise_rules(&source_layer.patterns, &target_layer.patterns, true)?;

        tracing::debug!(
            source,
            target,
            rules = synthesized.len(),
            "added layer dependency"
        );
        self.rules.extend(synthesized);
        Ok(())
    }

    /// Appends a pre-built dependency rule.
    pub fn add_dependency_constraint(&mut self, rule: DependencyRule) {
        self.rules.push(rule);
    }

    /// First layer owning a package path.
    #[must_use]
    pub fn layer_of(&self, path: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.contains(path))
    }

    /// Checks every layered package's imports against the allow rules.
    ///
    /// Packages outside every layer, standard-library imports (no `.` and
    /// no `/`), imports outside every layer, and same-layer imports are
    /// skipped.
    #[must_use]
    pub fn check(&self, arch: &Architecture) -> Vec<String> {
        let mut violations = Vec::new();

        for (package_path, package) in arch.packages() {
            let Some(source_index) = self.index_of(package_path) else {
                continue;
            };
            let source_layer = &self.layers[source_index];

            for import_path in package.imports() {
                if !import_path.contains('.') && !import_path.contains('/') {
                    continue;
                }

                let Some(target_index) = self.index_of(import_path) else {
                    continue;
                };
                if target_index == source_index {
                    continue;
                }

                let allowed = self
                    .rules
                    .iter()
                    .any(|r| r.is_allowed() && r.applies_to(package_path, import_path));

                if !allowed {
                    violations.push(format!(
                        "Package {package_path:?} in layer {:?} imports {import_path:?} in layer {:?}, but no rule allows this dependency",
                        source_layer.name, self.layers[target_index].name,
                    ));
                }
            }
        }

        violations
    }

    /// [`check`](Self::check) with a pass flag.
    #[must_use]
    pub fn validate(&self, arch: &Architecture) -> (bool, Vec<String>) {
        let violations = self.check(arch);
        (violations.is_empty(), violations)
    }

    fn index_of(&self, path: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.contains(path))
    }
}

fn pairwise_rules(
    sources: &[String],
    targets: &[String],
    allowed: bool,
) -> Result<Vec<DependencyRule>, RuleError> {
    let mut rules = Vec::with_capacity(sources.len() * targets.len());
    for source in sources {
        for target in targets {
            rules.push(DependencyRule::new(
                &fragment::suffix_expression(source),
                &fragment::suffix_expression(target),
                allowed,
            )?);
        }
    }
    Ok(rules)
}

impl Architecture {
    /// Creates a layered architecture already bound to this architecture.
    #[must_use]
    pub fn new_layered_architecture(&self, layers: Vec<Layer>) -> LayeredArchitecture {
        let mut layered = LayeredArchitecture::new(layers);
        layered.bind(self);
        layered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, Package, Parameter, Struct};

    fn layer(name: &str, pattern: &str) -> Layer {
        Layer::new(name, [pattern]).unwrap()
    }

    fn arch(packages: &[(&str, &[&str])]) -> Architecture {
        let mut arch = Architecture::new("/project");
        for (path, imports) in packages {
            let mut p = Package::new(*path, *path);
            for imp in *imports {
                p.add_import(*imp, None);
            }
            arch.insert_package(p);
        }
        arch
    }

    #[test]
    fn invalid_layer_pattern_fails() {
        let err = Layer::new("Broken", ["(domain"]).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn containment_is_suffix_transitive() {
        let utils = layer("Utils", "utils");
        assert!(utils.contains("utils"));
        assert!(utils.contains("utils/sub"));
        assert!(!utils.contains("myutils"));
    }

    #[test]
    fn anchored_pattern_covers_nested_packages() {
        let domain = layer("Domain", "^domain$");
        assert!(domain.contains("domain/entities"));
        assert!(domain.contains("github.com/acme/app/domain"));
    }

    #[test]
    fn domain_importing_utils_without_rule_is_one_violation() {
        let arch = arch(&[
            ("domain", &["github.com/acme/app/utils", "errors"]),
            ("utils", &["fmt", "time"]),
        ]);
        let layered =
            arch.new_layered_architecture(vec![layer("Domain", "domain"), layer("Utils", "utils")]);
        let violations = layered.check(&arch);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("\"domain\""));
        assert!(violations[0].contains("utils"));
        insta::assert_snapshot!(
            violations[0],
            @r#"Package "domain" in layer "Domain" imports "github.com/acme/app/utils" in layer "Utils", but no rule allows this dependency"#
        );
    }

    #[test]
    fn allow_rule_permits_edge() {
        let arch = arch(&[
            ("application", &["github.com/acme/app/domain"]),
            ("domain", &[]),
        ]);
        let mut layered = LayeredArchitecture::new(vec![
            layer("Domain", "domain"),
            layer("Application", "application"),
            layer("Utils", "utils"),
        ]);
        layered.add_rule("Application", "Domain").unwrap();
        let (passed, violations) = layered.validate(&arch);
        assert!(passed, "{violations:?}");
    }

    #[test]
    fn allow_rule_covers_nested_packages() {
        let arch = arch(&[(
            "application/commands",
            &["github.com/acme/app/domain/entities"],
        )]);
        let mut layered = LayeredArchitecture::new(vec![
            layer("Domain", "^domain$"),
            layer("Application", "^application$"),
        ]);
        layered.add_rule("Application", "Domain").unwrap();
        assert!(layered.check(&arch).is_empty());
    }

    #[test]
    fn reverse_edge_is_not_allowed() {
        let arch = arch(&[("domain", &["github.com/acme/app/application"])]);
        let mut layered = LayeredArchitecture::new(vec![
            layer("Domain", "domain"),
            layer("Application", "application"),
        ]);
        layered.add_rule("Application", "Domain").unwrap();
        assert_eq!(layered.check(&arch).len(), 1);
    }

    #[test]
    fn stdlib_and_unlayered_imports_are_skipped() {
        let arch = arch(&[
            ("domain", &["errors", "github.com/google/uuid"]),
            ("scripts", &["github.com/acme/app/domain"]),
        ]);
        let layered = LayeredArchitecture::new(vec![layer("Domain", "domain")]);
        assert!(layered.check(&arch).is_empty());
    }

    #[test]
    fn same_layer_imports_are_permitted() {
        let arch = arch(&[("domain/events", &["github.com/acme/app/domain/entities"])]);
        let layered = LayeredArchitecture::new(vec![layer("Domain", "domain")]);
        assert!(layered.check(&arch).is_empty());
    }

    #[test]
    fn multi_pattern_target_layer_uses_any_pattern() {
        let arch = arch(&[("domain", &["github.com/acme/app/db"])]);
        let infra = Layer::new("Infrastructure", ["infrastructure", "db"]).unwrap();
        let layered = LayeredArchitecture::new(vec![layer("Domain", "domain"), infra]);
        let violations = layered.check(&arch);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("Infrastructure"));
    }

    #[test]
    fn add_rule_cross_product() {
        let mut layered = LayeredArchitecture::new(vec![
            Layer::new("A", ["a1", "a2"]).unwrap(),
            Layer::new("B", ["b1", "b2", "b3"]).unwrap(),
        ]);
        layered.add_rule("A", "B").unwrap();
        assert_eq!(layered.rules().len(), 6);
        assert!(layered.rules().iter().all(DependencyRule::is_allowed));
    }

    #[test]
    fn add_rule_unknown_layer() {
        let mut layered = LayeredArchitecture::new(vec![layer("Domain", "domain")]);
        assert!(matches!(
            layered.add_rule("Domain", "Missing"),
            Err(RuleError::UnknownLayer { role: "target", .. })
        ));
        assert!(matches!(
            layered.add_rule("Missing", "Domain"),
            Err(RuleError::UnknownLayer { role: "source", .. })
        ));
    }

    #[test]
    fn layer_depends_on_delegates() {
        let domain = layer("Domain", "domain");
        let app = layer("Application", "application");
        let mut layered = LayeredArchitecture::new(vec![domain.clone(), app.clone()]);
        app.depends_on("Domain", &mut layered).unwrap();
        app.depends_on_layer(&domain, &mut layered).unwrap();
        assert_eq!(layered.rules().len(), 2);
    }

    #[test]
    fn scoped_constructors_require_bind() {
        let domain = layer("Domain", "domain");
        assert!(matches!(
            domain.does_not_depend_on("utils"),
            Err(RuleError::Unbound { .. })
        ));
        assert!(matches!(
            domain.structs_implement_interfaces(".*", ".*"),
            Err(RuleError::Unbound { .. })
        ));
    }

    #[test]
    fn does_not_depend_on_layer_detects_nested_import() {
        let arch = arch(&[(
            "domain/entities",
            &["github.com/acme/app/application/dto"],
        )]);
        let layered = arch.new_layered_architecture(vec![
            layer("Domain", "^domain$"),
            layer("Application", "^application$"),
        ]);
        let domain = layered.where_layer("Domain").unwrap();
        let app = layered.where_layer("Application").unwrap();
        let rules = domain.does_not_depend_on_layer(app).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(arch.check_dependencies(&rules).len(), 1);
    }

    #[test]
    fn does_not_depend_on_layer_is_pairwise() {
        let arch = arch(&[("domain", &["github.com/acme/app/api/v1"])]);
        let layered = arch.new_layered_architecture(vec![
            layer("Domain", "^domain$"),
            Layer::new("Outer", ["api", "api/v1"]).unwrap(),
        ]);
        let domain = layered.where_layer("Domain").unwrap();
        let outer = layered.where_layer("Outer").unwrap();

        let rules = domain.does_not_depend_on_layer(outer).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(arch.check_dependencies(&rules).len(), 2);
    }

    #[test]
    fn does_not_depend_on_keeps_target_pattern() {
        let arch = arch(&[("domain", &["github.com/acme/app/utils"])]);
        let layered = arch.new_layered_architecture(vec![layer("Domain", "^domain$")]);
        let rule = layered
            .where_layer("Domain")
            .unwrap()
            .does_not_depend_on("/utils$")
            .unwrap();
        assert_eq!(rule.target().as_str(), "/utils$");
        assert_eq!(arch.check_dependencies(&[rule]).len(), 1);
    }

    #[test]
    fn scoped_parameter_rule_ignores_other_layers() {
        let mut arch = Architecture::new("/project");
        for path in ["application", "presentation"] {
            let mut p = Package::new(path, path);
            p.add_struct(Struct::new("UserService", vec![]));
            p.attach_method(
                "UserService",
                Method::new("UpdateUser", vec![Parameter::new("l", "*Logger")], false),
            );
            arch.insert_package(p);
        }
        let mut utils = Package::new("utils", "utils");
        utils.add_struct(Struct::new("Logger", vec![]));
        arch.insert_package(utils);

        let layered =
            arch.new_layered_architecture(vec![layer("Application", "^application$")]);
        let rule = layered
            .where_layer("Application")
            .unwrap()
            .methods_should_use_interface_parameters(".*Service", "Update.*", "Logger")
            .unwrap();
        let violations = arch.check_method_parameters(&[rule]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("\"application\""));
    }

    #[test]
    fn check_is_idempotent() {
        let arch = arch(&[
            ("domain", &["github.com/acme/app/utils", "github.com/acme/app/application"]),
            ("application", &["github.com/acme/app/utils"]),
        ]);
        let layered = LayeredArchitecture::new(vec![
            layer("Domain", "domain"),
            layer("Application", "application"),
            layer("Utils", "utils"),
        ]);
        let first = layered.check(&arch);
        let second = layered.check(&arch);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }
}
