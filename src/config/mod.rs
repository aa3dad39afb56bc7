mod init;
mod schema;

pub use init::run_init_wizard;
pub use schema::{Config, InputsConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the config directory path (~/.config/tunable-qf/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("tunable-qf"))
}

/// Get the default config file path (~/.config/tunable-qf/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/tunable-qf/config.yaml), and a missing default file yields
///   the default config so a round can be driven entirely from flags.
///
/// Relative input paths are resolved against the config file's directory.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content, &config_path)
}

fn parse_config(content: &str, config_path: &Path) -> Result<Config> {
    let mut config: Config = serde_saphyr::from_str(content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    if let Some(dir) = config_path.parent() {
        config.inputs.resolve_paths(dir);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_resolves_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "inputs:\n  contributions: contributions.csv\nround:\n  matching_pool: 1000\n",
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(
            config.inputs.contributions,
            Some(dir.path().join("contributions.csv"))
        );
        assert_eq!(config.round.matching_pool, 1000.0);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("missing.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "round:\n  matching_pool: [not, a, number]\n").unwrap();

        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn test_config_path_is_under_config_dir() {
        let path = get_config_path().unwrap();
        assert!(path.ends_with(".config/tunable-qf/config.yaml"));
    }
}
