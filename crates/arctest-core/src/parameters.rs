//! Parameter shape rules: methods should accept interfaces (or structs).

use std::collections::HashSet;

use crate::error::RuleError;
use crate::interfaces::struct_matches;
use crate::model::{Architecture, Package};
use crate::pattern::Pattern;

/// Built-in scalar types, never classified.
const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "string",
    "byte",
    "rune",
    "error",
];

/// Whether `type_name` is a built-in scalar.
#[must_use]
pub fn is_builtin_type(type_name: &str) -> bool {
    BUILTIN_TYPES.contains(&type_name)
}

/// Classification of a parameter type against the extracted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Some interface has this simple or package-qualified name.
    Interface,
    /// Some struct has this name (and no interface does).
    Struct,
    /// Not declared anywhere in the model.
    Unknown,
}

/// Methods of matching structs should take interface (or struct)
/// parameters for types matching `parameter_type_pattern`.
///
/// Struct names match as in [`InterfaceImplementationRule`](crate::InterfaceImplementationRule):
/// bare names, plus qualified names for layer-built rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRule {
    struct_pattern: Pattern,
    method_pattern: Pattern,
    parameter_type_pattern: Pattern,
    should_use_interface: bool,
    qualified: bool,
}

impl ParameterRule {
    /// Creates a new parameter rule.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to compile.
    pub fn new(
        struct_pattern: &str,
        method_pattern: &str,
        parameter_type_pattern: &str,
        should_use_interface: bool,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            struct_pattern: Pattern::new(struct_pattern)
                .map_err(|e| RuleError::pattern("struct pattern", e))?,
            method_pattern: Pattern::new(method_pattern)
                .map_err(|e| RuleError::pattern("method pattern", e))?,
            parameter_type_pattern: Pattern::new(parameter_type_pattern)
                .map_err(|e| RuleError::pattern("parameter type pattern", e))?,
            should_use_interface,
            qualified: false,
        })
    }

    #[must_use]
    pub(crate) fn with_qualified_names(mut self) -> Self {
        self.qualified = true;
        self
    }

    /// Pattern for struct names.
    #[must_use]
    pub fn struct_pattern(&self) -> &Pattern {
        &self.struct_pattern
    }

    /// Pattern for method names.
    #[must_use]
    pub fn method_pattern(&self) -> &Pattern {
        &self.method_pattern
    }

    /// Pattern for normalized parameter types.
    #[must_use]
    pub fn parameter_type_pattern(&self) -> &Pattern {
        &self.parameter_type_pattern
    }

    /// `true` when matching parameters must be interfaces.
    #[must_use]
    pub fn should_use_interface(&self) -> bool {
        self.should_use_interface
    }
}

/// Name index of every declared type, simple and qualified by package name.
struct TypeIndex {
    interfaces: HashSet<String>,
    structs: HashSet<String>,
}

impl TypeIndex {
    fn build(arch: &Architecture) -> Self {
        let mut interfaces = HashSet::new();
        let mut structs = HashSet::new();
        for package in arch.packages().values() {
            for name in package.interfaces().keys() {
                interfaces.insert(name.clone());
                interfaces.insert(format!("{}.{name}", package.name()));
            }
            for name in package.structs().keys() {
                structs.insert(name.clone());
                structs.insert(format!("{}.{name}", package.name()));
            }
        }
        Self {
            interfaces,
            structs,
        }
    }

    /// Classifies `type_name` as written in `owner`.
    ///
    /// A `pkg.T` whose `pkg` is one of the owner's import aliases is looked
    /// up in the imported package first; anything else falls back to the
    /// name index.
    fn classify_in(
        &self,
        arch: &Architecture,
        owner: Option<&Package>,
        type_name: &str,
    ) -> TypeClass {
        let imported = type_name.split_once('.').and_then(|(alias, name)| {
            let import_path = owner?.import_aliases().get(alias)?;
            Some((imported_package(arch, import_path)?, name))
        });
        if let Some((package, name)) = imported {
            if package.interfaces().contains_key(name) {
                return TypeClass::Interface;
            }
            if package.structs().contains_key(name) {
                return TypeClass::Struct;
            }
        }
        self.classify(type_name)
    }

    fn classify(&self, type_name: &str) -> TypeClass {
        if self.interfaces.contains(type_name) {
            TypeClass::Interface
        } else if self.structs.contains(type_name) {
            TypeClass::Struct
        } else {
            TypeClass::Unknown
        }
    }
}

/// The extracted package an import path refers to: the longest package
/// path that the import path equals or ends with at a segment boundary.
fn imported_package<'a>(arch: &'a Architecture, import_path: &str) -> Option<&'a Package> {
    arch.packages()
        .values()
        .filter(|p| {
            let path = p.path();
            path != "."
                && (import_path == path
                    || import_path
                        .strip_suffix(path)
                        .is_some_and(|prefix| prefix.ends_with('/')))
        })
        .max_by_key(|p| p.path().len())
}

impl Architecture {
    /// Creates a rule requiring interface parameters.
    ///
    /// # Errors
    ///
    /// See [`ParameterRule::new`].
    pub fn methods_should_use_interface_parameters(
        &self,
        struct_pattern: &str,
        method_pattern: &str,
        parameter_type_pattern: &str,
    ) -> Result<ParameterRule, RuleError> {
        ParameterRule::new(struct_pattern, method_pattern, parameter_type_pattern, true)
    }

    /// Creates a rule requiring struct parameters.
    ///
    /// # Errors
    ///
    /// See [`ParameterRule::new`].
    pub fn methods_should_use_struct_parameters(
        &self,
        struct_pattern: &str,
        method_pattern: &str,
        parameter_type_pattern: &str,
    ) -> Result<ParameterRule, RuleError> {
        ParameterRule::new(struct_pattern, method_pattern, parameter_type_pattern, false)
    }

    /// Classifies a type name (pointer marker already removed).
    #[must_use]
    pub fn classify_type(&self, type_name: &str) -> TypeClass {
        TypeIndex::build(self).classify(type_name)
    }

    /// Evaluates parameter shape rules.
    ///
    /// Empty, built-in, and undeclared parameter types are skipped.
    #[must_use]
    pub fn check_method_parameters(&self, rules: &[ParameterRule]) -> Vec<String> {
        let index = TypeIndex::build(self);
        let mut violations = Vec::new();

        for rule in rules {
            for s in self
                .structs()
                .filter(|s| struct_matches(&rule.struct_pattern, rule.qualified, s))
            {
                let owner = self.package(s.package_path());
                for method in s
                    .methods()
                    .iter()
                    .filter(|m| rule.method_pattern.matches(&m.name))
                {
                    for param in &method.params {
                        let type_name = param.normalized_type();
                        if type_name.is_empty()
                            || is_builtin_type(type_name)
                            || !rule.parameter_type_pattern.matches(type_name)
                        {
                            continue;
                        }

                        match (
                            index.classify_in(self, owner, type_name),
                            rule.should_use_interface,
                        ) {
                            (TypeClass::Struct, true) => violations.push(format!(
                                "Method {:?} of struct {:?} in package {:?} uses struct type {type_name:?} as parameter, but should use an interface",
                                method.name,
                                s.name(),
                                s.package_path(),
                            )),
                            (TypeClass::Interface, false) => violations.push(format!(
                                "Method {:?} of struct {:?} in package {:?} uses interface type {type_name:?} as parameter, but should use a struct",
                                method.name,
                                s.name(),
                                s.package_path(),
                            )),
                            _ => {}
                        }
                    }
                }
            }
        }

        violations
    }

    /// [`check_method_parameters`](Self::check_method_parameters) with a
    /// pass flag.
    #[must_use]
    pub fn validate_method_parameters(&self, rules: &[ParameterRule]) -> (bool, Vec<String>) {
        let violations = self.check_method_parameters(rules);
        (violations.is_empty(), violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, Method, Package, Parameter, Struct};

    /// `utils.Logger` struct, `domain.LoggerInterface` interface, and an
    /// `application.UserService` taking a concrete logger.
    fn logger_arch(param_type: &str) -> Architecture {
        let mut utils = Package::new("utils", "utils");
        utils.add_struct(Struct::new("Logger", vec![]));

        let mut domain = Package::new("domain", "domain");
        domain.add_interface(Interface::new(
            "LoggerInterface",
            vec![Method::new("Log", vec![Parameter::new("msg", "string")], false)],
        ));

        let mut app = Package::new("application", "application");
        app.add_struct(Struct::new("UserService", vec![]));
        app.attach_method(
            "UserService",
            Method::new(
                "UpdateUser",
                vec![
                    Parameter::new("id", "string"),
                    Parameter::new("logger", param_type),
                ],
                true,
            ),
        );

        let mut arch = Architecture::new(".");
        arch.insert_package(utils);
        arch.insert_package(domain);
        arch.insert_package(app);
        arch
    }

    #[test]
    fn builtin_types() {
        assert!(is_builtin_type("string"));
        assert!(is_builtin_type("error"));
        assert!(is_builtin_type("complex128"));
        assert!(!is_builtin_type("Logger"));
    }

    #[test]
    fn concrete_logger_violates_interface_rule() {
        let arch = logger_arch("*utils.Logger");
        let rule = arch
            .methods_should_use_interface_parameters(".*Service.*", "Update.*", ".*Logger")
            .unwrap();
        let violations = arch.check_method_parameters(&[rule]);
        assert_eq!(violations.len(), 1);
        insta::assert_snapshot!(
            violations[0],
            @r#"Method "UpdateUser" of struct "UserService" in package "application" uses struct type "utils.Logger" as parameter, but should use an interface"#
        );
    }

    #[test]
    fn concrete_logger_passes_struct_rule() {
        let arch = logger_arch("*utils.Logger");
        let rule = arch
            .methods_should_use_struct_parameters(".*Service.*", "Update.*", ".*Logger")
            .unwrap();
        assert!(arch.check_method_parameters(&[rule]).is_empty());
    }

    #[test]
    fn interface_param_violates_struct_rule() {
        let arch = logger_arch("domain.LoggerInterface");
        let rule = ParameterRule::new(".*Service", "Update.*", ".*Logger.*", false).unwrap();
        let (passed, violations) = arch.validate_method_parameters(&[rule]);
        assert!(!passed);
        assert!(violations[0].contains("uses interface type \"domain.LoggerInterface\""));
    }

    #[test]
    fn pointer_marker_does_not_change_classification() {
        let arch = logger_arch("Logger");
        assert_eq!(arch.classify_type("Logger"), TypeClass::Struct);
        let rule = ParameterRule::new(".*Service", "Update.*", "Logger", true).unwrap();
        let plain = arch.check_method_parameters(std::slice::from_ref(&rule));

        let arch = logger_arch("*Logger");
        let pointer = arch.check_method_parameters(&[rule]);
        assert_eq!(plain, pointer);
        assert_eq!(plain.len(), 1);
    }

    #[test]
    fn unknown_types_are_skipped() {
        let arch = logger_arch("*zap.Logger");
        assert_eq!(arch.classify_type("zap.Logger"), TypeClass::Unknown);
        let rule = ParameterRule::new(".*", ".*", ".*", true).unwrap();
        assert!(arch.check_method_parameters(&[rule]).is_empty());
    }

    #[test]
    fn empty_type_text_is_skipped() {
        let arch = logger_arch("");
        let rule = ParameterRule::new(".*", ".*", ".*", true).unwrap();
        assert!(arch.check_method_parameters(&[rule]).is_empty());
    }

    #[test]
    fn interface_name_wins_over_struct_name() {
        let mut arch = logger_arch("Logger");
        let mut extra = Package::new("ports", "ports");
        extra.add_interface(Interface::new("Logger", vec![]));
        arch.insert_package(extra);
        assert_eq!(arch.classify_type("Logger"), TypeClass::Interface);
    }

    #[test]
    fn aliased_import_resolves_to_imported_package() {
        let mut arch = logger_arch("*log.Logger");
        let mut app = arch.package("application").unwrap().clone();
        app.add_import("github.com/acme/shop/utils", Some("log"));
        arch.insert_package(app);

        let rule = ParameterRule::new(".*Service", "Update.*", "Logger", true).unwrap();
        let violations = arch.check_method_parameters(&[rule]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("uses struct type \"log.Logger\""));
    }

    #[test]
    fn alias_shadowing_a_package_name_follows_the_import() {
        let mut arch = logger_arch("domain.Logger");
        let mut app = arch.package("application").unwrap().clone();
        app.add_import("github.com/acme/shop/utils", Some("domain"));
        arch.insert_package(app);

        assert_eq!(arch.classify_type("domain.Logger"), TypeClass::Unknown);
        let rule = ParameterRule::new(".*Service", "Update.*", "Logger", true).unwrap();
        assert_eq!(arch.check_method_parameters(&[rule]).len(), 1);
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        let err = ParameterRule::new(".*", "(", ".*", true).unwrap_err();
        assert!(err.to_string().contains("method pattern"));
    }
}
