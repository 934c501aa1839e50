//! Server configuration
//!
//! Defaults match a local development setup; `from_env` lets a deployment
//! pick the port the same way the browser client expects (`PORT`).

use std::env;

use crate::error::AppError;

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Capacity of the handler → actor command channel
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            command_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Build from `RELAY_ADDR` or `PORT`, falling back to defaults
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(env::var("RELAY_ADDR").ok(), env::var("PORT").ok())
    }

    fn from_vars(addr: Option<String>, port: Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(addr) = addr {
            config.listen_addr = addr;
        } else if let Some(port) = port {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidConfig(format!("PORT must be a port number, got '{}'", port)))?;
            config.listen_addr = format!("0.0.0.0:{}", port);
        }

        Ok(config)
    }
}
