//! Server configuration, populated from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration for a Redline server.
///
/// All fields come from environment variables with defaults, so the server
/// starts with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `REDLINE_BIND` | `0.0.0.0:3000` | TCP socket address to listen on |
/// | `REDLINE_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `REDLINE_REVISE_URL` | (absent = echo) | HTTP endpoint of the rewrite service |
/// | `REDLINE_REVISE_TIMEOUT_SECS` | `120` | Timeout for one rewrite call |
/// | `REDLINE_EVENT_CAPACITY` | `64` | Per-chapter outbound event buffer |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    /// Endpoint of the rewrite service. `None` installs a reviser that
    /// returns its input unchanged.
    pub revise_url: Option<String>,

    pub revise_timeout: Duration,

    /// How many outbound events a slow subscriber may fall behind before it
    /// is told to resync.
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            db_path: None,
            revise_url: None,
            revise_timeout: Duration::from_secs(120),
            event_capacity: 64,
        }
    }
}

impl ServerConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("REDLINE_BIND") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "REDLINE_BIND",
                expected: "a socket address (e.g. 0.0.0.0:3000)",
                value: v,
            })?,
            None => defaults.bind_addr,
        };

        let revise_timeout = match lookup("REDLINE_REVISE_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| ConfigError::Invalid {
                var: "REDLINE_REVISE_TIMEOUT_SECS",
                expected: "a number of seconds",
                value: v,
            })?),
            None => defaults.revise_timeout,
        };

        let event_capacity = match lookup("REDLINE_EVENT_CAPACITY") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "REDLINE_EVENT_CAPACITY",
                        expected: "a positive integer",
                        value: v,
                    })
                }
            },
            None => defaults.event_capacity,
        };

        Ok(Self {
            bind_addr,
            db_path: lookup("REDLINE_DB").filter(|p| !p.is_empty()),
            revise_url: lookup("REDLINE_REVISE_URL").filter(|u| !u.is_empty()),
            revise_timeout,
            event_capacity,
        })
    }
}
