use std::{env, net::SocketAddr};

use thiserror::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// `bind_addr` and `port` resolved at load time.
    pub socket: SocketAddr,
    pub server_name: String,
    pub server_version: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_SERVER_NAME must not be empty")]
    EmptyServerName,
    #[error("LOG_FORMAT must be \"compact\" or \"json\"")]
    InvalidLogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT")
            .map(|value| value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let server_name = match lookup("MCP_SERVER_NAME") {
            Some(name) if name.trim().is_empty() => return Err(ConfigError::EmptyServerName),
            Some(name) => name.trim().to_string(),
            None => "toolbridge".to_string(),
        };
        let server_version = lookup("MCP_SERVER_VERSION")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::InvalidLogFormat),
        };

        let socket = format!("{bind_addr}:{port}")
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)?;

        Ok(Self {
            bind_addr,
            port,
            socket,
            server_name,
            server_version,
            log_format,
        })
    }
}
