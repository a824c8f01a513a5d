//! Allow/deny import rules between package sets.

use crate::error::RuleError;
use crate::model::Architecture;
use crate::pattern::Pattern;

/// An import rule: packages matching `source` may (or may not) import
/// paths matching `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
    source: Pattern,
    target: Pattern,
    allowed: bool,
}

impl DependencyRule {
    /// Creates a new dependency rule.
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern is empty or fails to compile.
    pub fn new(source: &str, target: &str, allowed: bool) -> Result<Self, RuleError> {
        if source.is_empty() {
            return Err(RuleError::EmptyPattern { which: "source" });
        }
        if target.is_empty() {
            return Err(RuleError::EmptyPattern { which: "target" });
        }
        let source = Pattern::new(source).map_err(|e| RuleError::pattern("source pattern", e))?;
        let target = Pattern::new(target).map_err(|e| RuleError::pattern("target pattern", e))?;
        Ok(Self {
            source,
            target,
            allowed,
        })
    }

    /// Pattern matched against the importing package path.
    #[must_use]
    pub fn source(&self) -> &Pattern {
        &self.source
    }

    /// Pattern matched against the import path.
    #[must_use]
    pub fn target(&self) -> &Pattern {
        &self.target
    }

    /// Whether the rule permits the dependency.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Tests whether this rule covers the `(package, import)` pair.
    #[must_use]
    pub fn applies_to(&self, package_path: &str, import_path: &str) -> bool {
        self.source.matches(package_path) && self.target.matches(import_path)
    }
}

impl Architecture {
    /// Creates a rule permitting `source` packages to import `target`.
    ///
    /// # Errors
    ///
    /// See [`DependencyRule::new`].
    pub fn depends_on(&self, source: &str, target: &str) -> Result<DependencyRule, RuleError> {
        DependencyRule::new(source, target, true)
    }

    /// Creates a rule forbidding `source` packages to import `target`.
    ///
    /// # Errors
    ///
    /// See [`DependencyRule::new`].
    pub fn does_not_depend_on(
        &self,
        source: &str,
        target: &str,
    ) -> Result<DependencyRule, RuleError> {
        DependencyRule::new(source, target, false)
    }

    /// Evaluates dependency rules against every import of every package.
    ///
    /// Each disallow rule covering a `(package, import)` pair yields its own
    /// violation; allow rules never yield violations here.
    #[must_use]
    pub fn check_dependencies(&self, rules: &[DependencyRule]) -> Vec<String> {
        let mut violations = Vec::new();

        for (package_path, package) in self.packages() {
            for import_path in package.imports() {
                for rule in rules {
                    if !rule.allowed && rule.applies_to(package_path, import_path) {
                        violations.push(format!(
                            "Package {package_path:?} imports {import_path:?}, but this is not allowed by rule: {} cannot import {}",
                            rule.source, rule.target,
                        ));
                    }
                }
            }
        }

        violations
    }

    /// [`check_dependencies`](Self::check_dependencies) with a pass flag.
    #[must_use]
    pub fn validate_dependencies(&self, rules: &[DependencyRule]) -> (bool, Vec<String>) {
        let violations = self.check_dependencies(rules);
        (violations.is_empty(), violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Package;

    fn arch_with(package: &str, imports: &[&str]) -> Architecture {
        let mut arch = Architecture::new(".");
        let mut p = Package::new(package, package);
        for imp in imports {
            p.add_import(*imp, None);
        }
        arch.insert_package(p);
        arch
    }

    #[test]
    fn rejects_empty_patterns() {
        assert!(matches!(
            DependencyRule::new("", "x", false),
            Err(RuleError::EmptyPattern { which: "source" })
        ));
        assert!(matches!(
            DependencyRule::new("x", "", false),
            Err(RuleError::EmptyPattern { which: "target" })
        ));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err = DependencyRule::new("domain", "[", false).unwrap_err();
        assert!(err.to_string().contains("target pattern"));
    }

    #[test]
    fn disallow_rule_reports_each_match() {
        let arch = arch_with("domain", &["acme/utils", "fmt"]);
        let rule = arch.does_not_depend_on("^domain$", "utils").unwrap();
        let violations = arch.check_dependencies(&[rule]);
        assert_eq!(violations.len(), 1);
        insta::assert_snapshot!(
            violations[0],
            @r#"Package "domain" imports "acme/utils", but this is not allowed by rule: ^domain$ cannot import utils"#
        );
    }

    #[test]
    fn allow_rule_never_reports() {
        let arch = arch_with("domain", &["acme/utils"]);
        let rule = arch.depends_on("domain", "utils").unwrap();
        assert!(arch.check_dependencies(&[rule]).is_empty());
    }

    #[test]
    fn duplicate_rules_are_not_deduplicated() {
        let arch = arch_with("domain", &["acme/utils"]);
        let rule = DependencyRule::new("domain", "utils", false).unwrap();
        let violations = arch.check_dependencies(&[rule.clone(), rule]);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn duplicate_imports_each_report() {
        let arch = arch_with("domain", &["acme/utils", "acme/utils"]);
        let rule = DependencyRule::new("domain", "utils", false).unwrap();
        let (passed, violations) = arch.validate_dependencies(&[rule]);
        assert!(!passed);
        assert_eq!(violations.len(), 2);
    }
}
