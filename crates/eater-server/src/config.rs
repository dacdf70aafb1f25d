//! Configuration loading for the eater server.
//!
//! The configuration lives in `eater-config.yaml`. Every section and
//! field has a default, so an empty file (or none at all) runs a normal
//! eater on `127.0.0.1:8080`.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! brain:
//!   feeding_period_secs: 1800
//!   seed: 42
//! fsm:
//!   max_postponed: 64
//! logging:
//!   level: debug
//! ```

use std::path::{Path, PathBuf};

use eater_brain::BrainConfig;
use eater_fsm::FsmConfig;
use serde::Deserialize;
use tracing::warn;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "eater-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EaterConfig {
    /// Listen address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Timings and thresholds of the eater itself.
    #[serde(default)]
    pub brain: BrainConfig,

    /// Engine limits shared by all four state machines.
    #[serde(default)]
    pub fsm: FsmConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EaterConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `EATER_HOST` overrides `server.host`
    /// - `EATER_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides();
        Ok(config)
    }

    /// Load from `EATER_CONFIG` if set, otherwise from
    /// [`DEFAULT_CONFIG_PATH`] when it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is present but unreadable or
    /// malformed.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = std::env::var_os("EATER_CONFIG").map_or_else(
            || {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                default.exists().then(|| default.to_path_buf())
            },
            |path| Some(PathBuf::from(path)),
        );
        match path {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => {
                let mut config = Self::default();
                config.server.apply_env_overrides();
                Ok((config, None))
            }
        }
    }
}

/// Where the command server listens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (default: `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the listen address with `EATER_HOST` and `EATER_PORT`
    /// when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// An unparsable port is logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("EATER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("EATER_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid EATER_PORT"),
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    8080
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output (default: false).
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}
