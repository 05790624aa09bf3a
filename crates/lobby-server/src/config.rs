//! Configuration for the lobby server.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables
//! 4. command-line flags (applied by the binary)
//!
//! Recognised environment variables:
//!
//! - `LOBBY_BIND_ADDR`   (default: "0.0.0.0")
//! - `LOBBY_PORT`        (default: "9000")
//! - `LOBBY_MAX_CLIENTS` (default: "1024")

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "LOBBY_BIND_ADDR";
pub const ENV_PORT: &str = "LOBBY_PORT";
pub const ENV_MAX_CLIENTS: &str = "LOBBY_MAX_CLIENTS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on. 0 picks an ephemeral port.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 9000,
            max_clients: 1024,
        }
    }
}

impl Config {
    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.with_env_from(|key| env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overlay whatever `lookup` returns for the `LOBBY_*` keys.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        if let Some(port) = parse_env(&lookup, ENV_PORT)? {
            self.port = port;
        }
        if let Some(max_clients) = parse_env(&lookup, ENV_MAX_CLIENTS)? {
            self.max_clients = max_clients;
        }
        Ok(self)
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_env<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
        None => Ok(None),
    }
}
