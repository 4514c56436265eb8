//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Interval between full-body heartbeat broadcasts, in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Interval between latency probes per connection, in milliseconds
    pub ping_probe_interval_ms: u64,

    /// Allowed client origin for CORS (comma-separated list)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            heartbeat_interval_ms: parse_or("HEARTBEAT_INTERVAL_MS", 100)?,
            ping_probe_interval_ms: parse_or("PING_PROBE_INTERVAL_MS", 2000)?,

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

fn parse_or(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(var)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid numeric value for environment variable: {0}")]
    InvalidNumber(&'static str),
}
