//! Check command implementation.

use anyhow::{bail, Context, Result};
use arctest::Config;
use std::path::Path;

use crate::config_resolver::{self, ConfigSource};
use crate::OutputFormat;

/// Runs the check command. Returns `true` when no violation was found.
pub fn run(
    project: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    let source = config_resolver::resolve(project, config_path);
    let config = load_config(&source)?;

    if verbose {
        super::output::print_config(&config);
    }

    let report = config
        .run_architecture_tests(project)
        .with_context(|| format!("Failed to check {}", project.display()))?;

    super::output::print(&report, format)?;
    Ok(report.passed())
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        bail!(
            "No configuration found (looked for {}). Run `arctest init` to create one.",
            config_resolver::PROJECT_CONFIG_NAMES.join(", ")
        );
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
layers:
  - name: Domain
    pattern: "^domain$"
  - name: Application
    pattern: "^application$"
rules:
  - from: Application
    to: Domain
"#;

    fn project(domain_imports_application: bool) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("domain")).unwrap();
        fs::create_dir_all(root.join("application")).unwrap();
        let domain = if domain_imports_application {
            "package domain\n\nimport \"example.com/app/application\"\n\nvar _ = application.X\n"
        } else {
            "package domain\n\ntype User struct{}\n"
        };
        fs::write(root.join("domain/user.go"), domain).unwrap();
        fs::write(
            root.join("application/service.go"),
            "package application\n\nimport \"example.com/app/domain\"\n\nvar _ = domain.User{}\n",
        )
        .unwrap();
        fs::write(root.join(".arctest.yml"), CONFIG).unwrap();
        tmp
    }

    #[test]
    fn clean_project_passes() {
        let tmp = project(false);
        let passed = run(tmp.path(), OutputFormat::Compact, None, false).unwrap();
        assert!(passed);
    }

    #[test]
    fn violation_fails_the_check() {
        let tmp = project(true);
        let passed = run(tmp.path(), OutputFormat::Compact, None, false).unwrap();
        assert!(!passed);
    }

    #[test]
    fn explicit_config_overrides_project_file() {
        let tmp = project(true);
        let permissive = tmp.path().join("permissive.yml");
        fs::write(
            &permissive,
            "layers:\n  - name: Domain\n    pattern: \"^domain$\"\n",
        )
        .unwrap();
        let passed = run(tmp.path(), OutputFormat::Json, Some(&permissive), false).unwrap();
        assert!(passed);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let tmp = project(false);
        fs::write(tmp.path().join(".arctest.yml"), "layers: []\n").unwrap();
        let err = run(tmp.path(), OutputFormat::Text, None, false).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load"));
    }

    #[test]
    fn missing_config_is_an_error() {
        let err = load_config(&ConfigSource::Missing).unwrap_err();
        assert!(err.to_string().contains("arctest init"));
    }
}
