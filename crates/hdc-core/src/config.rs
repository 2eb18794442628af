/*!
 * Configuration management for the HDC client.
 *
 * Settings are layered: built-in defaults, then an optional config file,
 * then environment variables, then an optional explicit override.
 */
use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default HDC server address
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8710";

/// Client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HDC server connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-operation response timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Device monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// HDC server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address in `host:port` form
    #[serde(default = "default_server_address")]
    pub address: String,

    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Response timeouts for the individual client operations, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Waiting for the single shell response packet
    #[serde(default = "default_shell_ms")]
    pub shell_ms: u64,

    /// Waiting for each install progress packet
    #[serde(default = "default_install_ms")]
    pub install_ms: u64,

    /// Waiting for each file transfer progress packet
    #[serde(default = "default_file_transfer_ms")]
    pub file_transfer_ms: u64,

    /// Idle time that ends a buffered hilog read
    #[serde(default = "default_hilog_ms")]
    pub hilog_ms: u64,

    /// Idle time that ends a hilog stream
    #[serde(default = "default_hilog_stream_ms")]
    pub hilog_stream_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Device monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Polling interval in seconds
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shell_ms: default_shell_ms(),
            install_ms: default_install_ms(),
            file_transfer_ms: default_file_transfer_ms(),
            hilog_ms: default_hilog_ms(),
            hilog_stream_ms: default_hilog_stream_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval_secs(),
        }
    }
}

fn default_server_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_shell_ms() -> u64 {
    5_000
}

fn default_install_ms() -> u64 {
    30_000
}

fn default_file_transfer_ms() -> u64 {
    60_000
}

fn default_hilog_ms() -> u64 {
    5_000
}

fn default_hilog_stream_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_monitor_interval_secs() -> u64 {
    2
}

impl Config {
    /// Check the values that would make the client unusable
    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(Error::config("server.address must not be empty"));
        }
        if self.server.connect_timeout_ms == 0 {
            return Err(Error::config("server.connect_timeout_ms must be greater than 0"));
        }
        if self.monitor.interval_secs == 0 {
            return Err(Error::config("monitor.interval_secs must be greater than 0"));
        }
        Ok(())
    }

    /// TCP connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.server.connect_timeout_ms)
    }
}

impl TimeoutConfig {
    /// Shell response timeout
    pub fn shell(&self) -> Duration {
        Duration::from_millis(self.shell_ms)
    }

    /// Install progress timeout
    pub fn install(&self) -> Duration {
        Duration::from_millis(self.install_ms)
    }

    /// File transfer progress timeout
    pub fn file_transfer(&self) -> Duration {
        Duration::from_millis(self.file_transfer_ms)
    }

    /// Buffered hilog idle timeout
    pub fn hilog(&self) -> Duration {
        Duration::from_millis(self.hilog_ms)
    }

    /// Hilog stream idle timeout
    pub fn hilog_stream(&self) -> Duration {
        Duration::from_millis(self.hilog_stream_ms)
    }
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<String>,
    environment_prefix: Option<String>,
    override_with: Option<Config>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Override with an existing config
    pub fn override_with(mut self, config: Config) -> Self {
        self.override_with = Some(config);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        let mut config_builder = ConfigLib::builder();

        let default_config = Config::default();
        config_builder = config_builder.add_source(
            ConfigLib::try_from(&default_config)
                .map_err(|e| Error::config(format!("Failed to create default config: {}", e)))?,
        );

        if let Some(config_file) = self.config_file {
            let path = Path::new(&config_file);
            if path.exists() {
                debug!("Loading configuration from {}", config_file);
                config_builder = config_builder.add_source(File::with_name(&config_file));
            } else {
                debug!("Configuration file {} does not exist, using defaults", config_file);
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!("Loading configuration from environment variables with prefix {}", prefix);
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config_lib = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?;

        let mut config: Config = config_lib
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        if let Some(override_config) = self.override_with {
            config = override_config;
        }

        config.validate()?;

        info!("Configuration loaded, server address {}", config.server.address);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:8710");
        assert_eq!(config.server.connect_timeout_ms, 10_000);
        assert_eq!(config.timeouts.shell(), Duration::from_secs(5));
        assert_eq!(config.timeouts.install(), Duration::from_secs(30));
        assert_eq!(config.timeouts.file_transfer(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.monitor.interval_secs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.server.address, DEFAULT_SERVER_ADDRESS);
        assert_eq!(config.timeouts.hilog_stream_ms, 30_000);
    }

    #[test]
    fn test_config_builder_missing_file_uses_defaults() {
        let config = ConfigBuilder::new()
            .with_config_file("/nonexistent/hdc.toml")
            .build()
            .unwrap();
        assert_eq!(config.server.address, DEFAULT_SERVER_ADDRESS);
    }

    #[test]
    fn test_config_builder_with_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("hdc.toml");

        {
            let mut file = File::create(&file_path)?;
            file.write_all(
                br#"
                [server]
                address = "192.168.1.20:8710"

                [timeouts]
                shell_ms = 15000

                [logging]
                level = "debug"
            "#,
            )?;
        }

        let config = ConfigBuilder::new().with_config_file(file_path).build()?;

        assert_eq!(config.server.address, "192.168.1.20:8710");
        assert_eq!(config.server.connect_timeout_ms, 10_000);
        assert_eq!(config.timeouts.shell(), Duration::from_secs(15));
        assert_eq!(config.timeouts.install_ms, 30_000);
        assert_eq!(config.logging.level, "debug");

        Ok(())
    }

    #[test]
    fn test_config_builder_with_env() -> Result<()> {
        env::set_var("HDCTEST__SERVER__ADDRESS", "10.0.0.5:8710");
        env::set_var("HDCTEST__MONITOR__INTERVAL_SECS", "7");

        let config = ConfigBuilder::new()
            .with_environment_prefix("hdctest")
            .build()?;

        assert_eq!(config.server.address, "10.0.0.5:8710");
        assert_eq!(config.monitor.interval_secs, 7);

        env::remove_var("HDCTEST__SERVER__ADDRESS");
        env::remove_var("HDCTEST__MONITOR__INTERVAL_SECS");

        Ok(())
    }

    #[test]
    fn test_override_is_validated() {
        let mut bad = Config::default();
        bad.server.address = "  ".to_string();

        let result = ConfigBuilder::new().override_with(bad).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.server.connect_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
