use std::env;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::config::ConfigError;

/// Where users are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongo,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            other => Err(ConfigError::ParseError(format!("Unknown STORAGE_BACKEND: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
}

impl AppConfig {
    /// Reads `APP_HOST`, `APP_PORT` and `STORAGE_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(s) => s
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("Invalid APP_PORT value: {}", s)))?,
            Err(_) => 8080,
        };
        let storage = match env::var("STORAGE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => {
                warn!("STORAGE_BACKEND not set, using in-memory storage");
                StorageBackend::Memory
            }
        };
        debug!(%host, port, ?storage, "Application configuration loaded");
        Ok(AppConfig { host, port, storage })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
        }
    }
}
