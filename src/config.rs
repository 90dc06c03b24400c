//! Server configuration, loaded from TOML.
//!
//! ```toml
//! bind = "0.0.0.0:3000"
//! read_timeout_secs = 15
//! request_timeout_secs = 15
//! method_override_field = "_method"
//! max_body_bytes = 10485760
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Why a configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `host:port` the server listens on.
    pub bind: String,
    /// Time allowed for a client to send the request head.
    pub read_timeout_secs: u64,
    /// Time allowed for the middleware and handler to produce a response.
    pub request_timeout_secs: u64,
    /// Form field read by [`MethodOverride`](crate::middleware::MethodOverride).
    pub method_override_field: String,
    /// Largest request body the server buffers; longer bodies get a 413.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_owned(),
            read_timeout_secs: 15,
            request_timeout_secs: 15,
            method_override_field: "_method".to_owned(),
            max_body_bytes: 10 << 20,
        }
    }
}

impl Config {
    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid("read_timeout_secs must be greater than 0".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be greater than 0".into()));
        }
        if self.method_override_field.is_empty() {
            return Err(ConfigError::Invalid("method_override_field must not be empty".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bind `{}` is not a host:port address", self.bind)))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
