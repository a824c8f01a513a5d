//! Locates the configuration document for a project.
//!
//! Lookup order:
//!
//! 1. `--config` (relative paths resolve under the project directory)
//! 2. `.arctest.yml`, `.arctest.yaml`, then `arctest.toml` in the project
//! 3. `config.yml` in the global directory (`$ARCTEST_CONFIG_DIR` or `~/.arctest/`)

use std::path::{Path, PathBuf};

/// Outcome of a config lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line. Not checked for existence.
    Explicit(PathBuf),
    /// One of the project-level file names.
    Project(PathBuf),
    /// The user-wide fallback.
    Global(PathBuf),
    /// Nothing found.
    Missing,
}

impl ConfigSource {
    /// Path of the config document, unless nothing was found.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Project(path) | Self::Global(path) => Some(path),
            Self::Missing => None,
        }
    }

    /// Whether the user-wide fallback was used.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// File names probed in the project directory, in priority order.
pub const PROJECT_CONFIG_NAMES: &[&str] = &[".arctest.yml", ".arctest.yaml", "arctest.toml"];

const GLOBAL_CONFIG_FILE: &str = "config.yml";

/// Finds the config for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    lookup(project_dir, explicit, global_config_dir().as_deref())
}

fn lookup(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(project_dir.join(path));
    }

    let local = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file());
    if let Some(found) = local {
        tracing::debug!(path = %found.display(), "using project config");
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_CONFIG_FILE)) {
        Some(found) if found.is_file() => {
            tracing::debug!(path = %found.display(), "using global config");
            ConfigSource::Global(found)
        }
        _ => ConfigSource::Missing,
    }
}

/// The user-wide config directory: `$ARCTEST_CONFIG_DIR`, else `~/.arctest/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os("ARCTEST_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".arctest")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "layers: []\n").unwrap();
        path
    }

    #[test]
    fn command_line_path_is_taken_as_given() {
        let project = tempfile::tempdir().unwrap();
        touch(project.path(), ".arctest.yml");

        let absolute = lookup(project.path(), Some(Path::new("/etc/none.yml")), None);
        assert_eq!(absolute, ConfigSource::Explicit(PathBuf::from("/etc/none.yml")));

        let relative = lookup(Path::new("/work/shop"), Some(Path::new("ci/arch.yml")), None);
        assert_eq!(relative.path(), Some(Path::new("/work/shop/ci/arch.yml")));
    }

    #[test]
    fn project_names_are_probed_in_order() {
        let project = tempfile::tempdir().unwrap();
        let toml = touch(project.path(), "arctest.toml");
        assert_eq!(lookup(project.path(), None, None), ConfigSource::Project(toml));

        let yaml = touch(project.path(), ".arctest.yaml");
        assert_eq!(lookup(project.path(), None, None), ConfigSource::Project(yaml));

        let yml = touch(project.path(), ".arctest.yml");
        assert_eq!(lookup(project.path(), None, None), ConfigSource::Project(yml));
    }

    #[test]
    fn directories_are_not_configs() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir(project.path().join(".arctest.yml")).unwrap();
        assert_eq!(lookup(project.path(), None, None), ConfigSource::Missing);
    }

    #[test]
    fn global_directory_is_the_last_resort() {
        let project = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        assert_eq!(
            lookup(project.path(), None, Some(home.path())),
            ConfigSource::Missing
        );

        let global = touch(home.path(), "config.yml");
        let found = lookup(project.path(), None, Some(home.path()));
        assert!(found.is_global());
        assert_eq!(found.path(), Some(global.as_path()));

        touch(project.path(), "arctest.toml");
        let found = lookup(project.path(), None, Some(home.path()));
        assert!(!found.is_global());
    }

    #[test]
    fn missing_has_no_path() {
        assert!(ConfigSource::Missing.path().is_none());
        assert!(!ConfigSource::Missing.is_global());
    }
}
