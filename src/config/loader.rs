//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::resources::StaticResourceConfig;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, validate_resources, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate proxy configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_toml(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration the way the binary does: file if present, defaults
/// otherwise, then environment overrides, then validation.
pub fn load_with_env(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) if path.exists() => read_toml(path)?,
        Some(path) => {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            ProxyConfig::default()
        }
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `var` to look up values.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| var(key).filter(|v| !v.is_empty());

    if let Some(port) = get("PORT") {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(url) = get("BACKEND_URL") {
        config.upstream.data_url = url;
    }
    if let Some(url) = get("BACKEND_META_URL") {
        config.upstream.meta_url = Some(url);
    }
    if let Some(token) = get("BACKEND_TOKEN") {
        config.upstream.token = token;
    }
    if let Some(base_id) = get("BACKEND_BASE_ID") {
        config.upstream.base_id = base_id;
    }
    if let Some(path) = get("PROXY_RESOURCES_PATH") {
        config.resources.path = path;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
}

/// Load and validate the resource allow-list.
pub fn load_resources(path: &Path) -> Result<StaticResourceConfig, ConfigError> {
    let resources: StaticResourceConfig = read_toml(path)?;
    validate_resources(&resources).map_err(ConfigError::Validation)?;
    Ok(resources)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("BACKEND_URL", "http://db:8090/api/v2/tables/"),
            ("BACKEND_TOKEN", "secret"),
            ("BACKEND_BASE_ID", "p_env"),
            ("LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = ProxyConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.upstream.data_url, "http://db:8090/api/v2/tables/");
        assert_eq!(config.upstream.token, "secret");
        assert_eq!(config.upstream.base_id, "p_env");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_config_reports_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schema]\nrefresh_interval_secs = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("schema.refresh_interval_secs"));
    }

    #[test]
    fn test_load_resources_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_id = \"p1\"\n[[resources]]\nkey = \"products\"\ntable = \"Products\"\noperations = [\"read\"]"
        )
        .unwrap();

        let resources = load_resources(file.path()).unwrap();
        assert_eq!(resources.base_id.as_deref(), Some("p1"));
        assert_eq!(resources.resources.len(), 1);
    }

    #[test]
    fn test_missing_resources_file_is_io_error() {
        let err = load_resources(Path::new("/nonexistent/resources.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
