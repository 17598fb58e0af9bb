// Configuration loader
// Reads ~/.autotask/config.toml, then applies environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;

/// Environment variable overriding the configured base address
pub const BASE_URL_ENV: &str = "AUTOTASK_BASE_URL";

/// Location of the user config file
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".autotask/config.toml"))
}

/// Load configuration from the user config file and environment
pub fn load_config() -> Result<Config> {
    let config = load_config_from(&config_path()?)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Load configuration from a specific file; a missing file yields defaults
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.client.base_url = base_url;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.client.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.client.timeout_seconds, None);
    }

    #[test]
    fn test_load_client_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[client]\nbase_url = \"http://automation:9000\"\ntimeout_seconds = 15"
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.client.base_url, "http://automation:9000");
        assert_eq!(config.client.timeout_seconds, Some(15));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client\nbase_url = ").unwrap();
        assert!(load_config_from(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        let config = apply_env_overrides(Config::default(), |key| {
            (key == BASE_URL_ENV).then(|| "http://override:1234".to_string())
        });
        assert_eq!(config.client.base_url, "http://override:1234");

        // Blank values are ignored
        let config = apply_env_overrides(Config::default(), |_| Some("  ".to_string()));
        assert_eq!(config.client.base_url, DEFAULT_BASE_URL);
    }
}
