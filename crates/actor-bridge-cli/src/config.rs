use actor_bridge::ClientConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// actor-bridge CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// RPC endpoint; the last path segment picks the transport
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_format: String,
    pub colors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: ClientConfig::default().endpoint,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "compact".to_string(),
            colors: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the standard location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(config_dir) = Self::config_dir() {
            let config_file = config_dir.join("config.toml");
            if config_file.exists() {
                debug!("Loading config from {}", config_file.display());
                config = Self::load_from_file(&config_file).with_context(|| {
                    format!("Failed to load config from {}", config_file.display())
                })?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("ACTOR_BRIDGE_ENDPOINT") {
            self.server.endpoint = endpoint;
        }

        if let Some(level) = lookup("ACTOR_BRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(colors) = lookup("ACTOR_BRIDGE_COLORS") {
            self.output.colors = colors.parse().unwrap_or(true);
        }
    }

    /// Get the config directory for this user
    pub fn config_dir() -> Result<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))
            })
            .map(|dir| dir.join("actor-bridge"))
    }

    /// Library connection settings for the configured endpoint
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.server.endpoint.clone(),
            user_agent: Some(format!("actor-bridge-cli/{}", env!("CARGO_PKG_VERSION"))),
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::WARN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.endpoint, "http://localhost:8080/jsonrpc");
        assert_eq!(config.output.default_format, "compact");
        assert!(config.output.colors);
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.server.endpoint, deserialized.server.endpoint);
        assert_eq!(
            config.output.default_format,
            deserialized.output.default_format
        );
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let config_content = r#"
[server]
endpoint = "http://actors.internal:9090/xmlrpc"

[output]
default_format = "json"
colors = false

[logging]
level = "debug"
"#;

        std::fs::write(&config_file, config_content).unwrap();
        let config = Config::load_from_file(&config_file).unwrap();

        assert_eq!(config.server.endpoint, "http://actors.internal:9090/xmlrpc");
        assert_eq!(config.output.default_format, "json");
        assert!(!config.output.colors);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[logging]\nlevel = \"info\"\n").unwrap();

        let config = Config::load_from_file(&config_file).unwrap();
        assert_eq!(config.server.endpoint, "http://localhost:8080/jsonrpc");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[server\nendpoint = 3").unwrap();

        let err = Config::load_from_file(&config_file).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "ACTOR_BRIDGE_ENDPOINT" => Some("http://other:1/xmlrpc".to_string()),
            "ACTOR_BRIDGE_COLORS" => Some("false".to_string()),
            _ => None,
        });

        assert_eq!(config.server.endpoint, "http://other:1/xmlrpc");
        assert!(!config.output.colors);
        assert_eq!(config.logging.level, "warn");
        assert!(config
            .client_config()
            .user_agent
            .unwrap()
            .starts_with("actor-bridge-cli/"));
    }
}
