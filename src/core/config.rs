use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Identity allowed to change fraud status, fixed for the process lifetime
    pub authority: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_wal_path")]
    pub wal_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_path: default_wal_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub api_key: String,
    /// External fraud verdict source; sync is disabled when unset
    #[serde(default)]
    pub fraud_feed_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_capacity() -> usize {
    50_000
}

fn default_event_buffer() -> usize {
    1024
}

fn default_wal_path() -> PathBuf {
    PathBuf::from("userauth.wal")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.directory.authority.trim().is_empty() {
            bail!("directory.authority must not be empty");
        }

        if self.directory.capacity == 0 {
            bail!("directory.capacity must be greater than 0");
        }

        if self.directory.event_buffer == 0 {
            bail!("directory.event_buffer must be greater than 0");
        }

        if self.persistence.wal_path.as_os_str().is_empty() {
            bail!("persistence.wal_path must not be empty");
        }

        if self.sync.api_key.is_empty() {
            bail!("api_key must not be empty");
        }

        if let Some(endpoint) = &self.sync.fraud_feed_endpoint {
            if endpoint.is_empty() {
                bail!("fraud_feed_endpoint must not be empty when set");
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [directory]
        authority = "0xowner"

        [sync]
        api_key = "test-api-key"
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.server.port, Some(8080));
        assert!(config.server.num_threads > 0);
        assert_eq!(config.directory.authority, "0xowner");
        assert_eq!(config.directory.capacity, 50_000);
        assert_eq!(config.directory.event_buffer, 1024);
        assert_eq!(config.persistence.wal_path, PathBuf::from("userauth.wal"));
        assert!(config.sync.fraud_feed_endpoint.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert!(!config.logging.console);
    }

    #[test]
    fn test_load_shipped_config() {
        let path = PathBuf::from("config.toml");
        let config = Config::from_file(&path).expect("Failed to load config");

        assert!(!config.directory.authority.is_empty());
        assert!(!config.sync.api_key.is_empty());
    }

    #[test]
    fn test_missing_authority_rejected() {
        let toml = r#"
            [server]
            port = 8080

            [directory]
            authority = "  "

            [sync]
            api_key = "k"
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_no_listener_rejected() {
        let toml = r#"
            [server]

            [directory]
            authority = "0xowner"

            [sync]
            api_key = "k"
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let toml = format!("{}\n[logging]\nlevel = \"loud\"\n", MINIMAL);
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn test_empty_feed_endpoint_rejected() {
        let toml = r#"
            [server]
            port = 8080

            [directory]
            authority = "0xowner"

            [sync]
            api_key = "k"
            fraud_feed_endpoint = ""
        "#;
        assert!(Config::from_toml(toml).is_err());
    }
}
