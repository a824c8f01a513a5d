//! Init command implementation.

use anyhow::{bail, Context, Result};
use arctest::Config;
use std::path::Path;

const CONFIG_NAME: &str = ".arctest.yml";

/// Writes a starter configuration into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    Config::starter()
        .save(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to match your package layout");
    println!("  2. Run: arctest check");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn writes_a_loadable_starter() {
        let tmp = TempDir::new().unwrap();
        run(tmp.path(), false).unwrap();

        let loaded = Config::from_file(&tmp.path().join(CONFIG_NAME)).unwrap();
        assert_eq!(loaded, Config::starter());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_NAME);
        fs::write(&path, "# mine\n").unwrap();

        let err = run(tmp.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

        run(tmp.path(), true).unwrap();
        assert!(Config::from_file(&path).is_ok());
    }
}
