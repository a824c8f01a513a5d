//! Structural interface satisfaction.

use crate::error::RuleError;
use crate::model::{Architecture, Interface, Struct};
use crate::pattern::Pattern;

/// Structs matching `struct_pattern` must satisfy at least one interface
/// matching `interface_pattern`.
///
/// The struct pattern is tested against bare struct names. Rules built by a
/// [`Layer`](crate::Layer) also test `<package path>.<Name>`, which is what
/// their scoped expression targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceImplementationRule {
    struct_pattern: Pattern,
    interface_pattern: Pattern,
    qualified: bool,
}

impl InterfaceImplementationRule {
    /// Creates a new rule.
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern fails to compile.
    pub fn new(struct_pattern: &str, interface_pattern: &str) -> Result<Self, RuleError> {
        Ok(Self {
            struct_pattern: Pattern::new(struct_pattern)
                .map_err(|e| RuleError::pattern("struct pattern", e))?,
            interface_pattern: Pattern::new(interface_pattern)
                .map_err(|e| RuleError::pattern("interface pattern", e))?,
            qualified: false,
        })
    }

    /// Also match struct patterns against qualified names.
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

    /// Pattern for interface names.
    #[must_use]
    pub fn interface_pattern(&self) -> &Pattern {
        &self.interface_pattern
    }
}

/// Whether `s` structurally satisfies `i`.
///
/// Every interface method needs a struct method with the same name, the
/// same parameter count, and the same return presence. An empty interface
/// is satisfied by everything.
#[must_use]
pub fn implements(s: &Struct, i: &Interface) -> bool {
    i.methods()
        .iter()
        .all(|required| s.methods().iter().any(|m| m.signature_matches(required)))
}

/// Matches a struct by bare name, and by `<package path>.<Name>` when
/// `qualified` is set.
pub(crate) fn struct_matches(pattern: &Pattern, qualified: bool, s: &Struct) -> bool {
    pattern.matches(s.name()) || (qualified && pattern.matches(&s.qualified_name()))
}

impl Struct {
    /// See [`implements`].
    #[must_use]
    pub fn implements(&self, interface: &Interface) -> bool {
        implements(self, interface)
    }
}

impl Architecture {
    /// Creates an [`InterfaceImplementationRule`].
    ///
    /// # Errors
    ///
    /// See [`InterfaceImplementationRule::new`].
    pub fn structs_implement_interfaces(
        &self,
        struct_pattern: &str,
        interface_pattern: &str,
    ) -> Result<InterfaceImplementationRule, RuleError> {
        InterfaceImplementationRule::new(struct_pattern, interface_pattern)
    }

    /// Evaluates interface implementation rules.
    ///
    /// A rule whose interface pattern matches nothing produces no
    /// violations.
    #[must_use]
    pub fn check_interface_implementations(
        &self,
        rules: &[InterfaceImplementationRule],
    ) -> Vec<String> {
        let mut violations = Vec::new();

        for rule in rules {
            let interfaces: Vec<&Interface> = self
                .interfaces()
                .filter(|i| rule.interface_pattern.matches(i.name()))
                .collect();

            if interfaces.is_empty() {
                tracing::debug!(
                    pattern = rule.interface_pattern.as_str(),
                    "no interfaces match, skipping rule"
                );
                continue;
            }

            for s in self
                .structs()
                .filter(|s| struct_matches(&rule.struct_pattern, rule.qualified, s))
            {
                if !interfaces.iter().any(|i| implements(s, i)) {
                    violations.push(format!(
                        "Struct {:?} in package {:?} does not implement any interface matching {:?}",
                        s.name(),
                        s.package_path(),
                        rule.interface_pattern.as_str(),
                    ));
                }
            }
        }

        violations
    }

    /// [`check_interface_implementations`](Self::check_interface_implementations)
    /// with a pass flag.
    #[must_use]
    pub fn validate_interface_implementations(
        &self,
        rules: &[InterfaceImplementationRule],
    ) -> (bool, Vec<String>) {
        let violations = self.check_interface_implementations(rules);
        (violations.is_empty(), violations)
    }

    /// Finds every struct that satisfies the named interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the package or the interface does not exist.
    pub fn find_all_implementations(
        &self,
        interface_name: &str,
        package_path: &str,
    ) -> Result<Vec<&Struct>, RuleError> {
        let package = self
            .package(package_path)
            .ok_or_else(|| RuleError::PackageNotFound(package_path.to_string()))?;
        let interface =
            package
                .interfaces()
                .get(interface_name)
                .ok_or_else(|| RuleError::InterfaceNotFound {
                    name: interface_name.to_string(),
                    package: package_path.to_string(),
                })?;

        Ok(self.structs().filter(|s| implements(s, interface)).collect())
    }
}
