// Configuration source loading.
//
// Priority order:
// 1. Environment variables (SPANRELAY_* prefix)
// 2. Config file path from SPANRELAY_CONFIG
// 3. Inline config content from SPANRELAY_CONFIG_CONTENT
// 4. Default config files (./spanrelay.toml, ./config.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_PATHS: [&str; 2] = ["./spanrelay.toml", "./config.toml"];

/// Load configuration using the host environment and filesystem.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = load_from_file()?.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("SPANRELAY_CONFIG") {
        return read_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("SPANRELAY_CONFIG_CONTENT") {
        let config = RuntimeConfig::from_toml(&content)
            .context("Failed to parse inline config from SPANRELAY_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_PATHS {
        let path = Path::new(path);
        if path.exists() {
            return read_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for the CLI --config flag).
/// Environment overrides still apply on top of the file.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let mut config = read_file(path.as_ref())?;
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults when no file is
/// found. A file that exists but fails to parse is still an error.
pub fn load_or_default() -> Result<RuntimeConfig> {
    load_config()
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [receiver]
            address = "127.0.0.1:7777"
            queue_size = 8

            [exporters.jaeger]
            collector_endpoint = "http://jaeger:14268/api/traces"
            "#
        )
        .unwrap();

        let config = load_from_file_path(file.path()).unwrap();
        assert_eq!(config.receiver.address, "127.0.0.1:7777");
        assert_eq!(config.receiver.queue_size, 8);
        let jaeger = config.exporters.jaeger.unwrap();
        assert_eq!(jaeger.collector_endpoint, "http://jaeger:14268/api/traces");
        assert_eq!(jaeger.timeout_secs, 10);
    }

    #[test]
    fn test_missing_or_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_from_file_path(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[receiver\nworkers = ").unwrap();
        let err = load_from_file_path(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
