use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

const DEFAULT_USER_COLLECTION: &str = "users";

/// MongoDB configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Database name
    pub database: String,
    /// Username for authentication (optional)
    pub username: Option<String>,
    /// Password for authentication (optional)
    pub password: Option<String>,
    /// Collection holding user documents (defaults to `users`)
    pub user_collection: Option<String>,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl MongoConfig {
    /// Load MongoDB configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONGO_URI: MongoDB connection URI (required)
    /// - MONGO_DATABASE: Database name (required)
    /// - MONGO_USERNAME / MONGO_PASSWORD: credentials (optional, both or neither)
    /// - MONGO_USER_COLLECTION: Collection name for users (optional)
    /// - MONGO_POOL_SIZE: Connection pool size (defaults to 10)
    /// - MONGO_CONNECTION_TIMEOUT: Connection timeout in seconds (defaults to 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");
        let defaults = MongoConfig::default();

        let config = MongoConfig {
            uri: required_var("MONGO_URI")?,
            database: required_var("MONGO_DATABASE")?,
            username: env::var("MONGO_USERNAME").ok(),
            password: env::var("MONGO_PASSWORD").ok(),
            user_collection: env::var("MONGO_USER_COLLECTION").ok(),
            pool_size: parsed_var("MONGO_POOL_SIZE", defaults.pool_size)?,
            connection_timeout_secs: parsed_var("MONGO_CONNECTION_TIMEOUT", defaults.connection_timeout_secs)?,
        };
        debug!(
            database = %config.database,
            collection = %config.user_collection(),
            pool_size = config.pool_size,
            timeout_secs = config.connection_timeout_secs,
            authenticated = config.username.is_some(),
            "MongoDB configuration read"
        );

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    /// Create MongoConfig for testing
    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "test_db".to_string(),
            username: Some("testuser".to_string()),
            password: Some("testpass".to_string()),
            user_collection: Some("test_users".to_string()),
            pool_size: 2,
            connection_timeout_secs: 2,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("MongoDB URI", &self.uri)?;
        non_empty("MongoDB database", &self.database)?;
        if self.pool_size == 0 {
            return Err(invalid("MongoDB pool size must be greater than 0"));
        }
        if self.connection_timeout_secs == 0 {
            return Err(invalid("MongoDB connection timeout must be greater than 0"));
        }
        for (name, value) in [
            ("MongoDB user collection", &self.user_collection),
            ("MongoDB username", &self.username),
            ("MongoDB password", &self.password),
        ] {
            if let Some(value) = value {
                non_empty(name, value)?;
            }
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(invalid("MongoDB username and password must be set together"));
        }
        Ok(())
    }

    /// Collection name for users, falling back to `users`
    pub fn user_collection(&self) -> &str {
        self.user_collection.as_deref().unwrap_or(DEFAULT_USER_COLLECTION)
    }
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| {
        error!("{} environment variable not found", key);
        ConfigError::EnvVarNotFound(key.to_string())
    })
}

fn parsed_var<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            error!("Invalid {} value: {}", key, raw);
            ConfigError::InvalidValue(format!("Invalid {} value", key))
        }),
        Err(_) => {
            warn!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

fn non_empty(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(invalid(&format!("{} cannot be empty", name)));
    }
    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    error!("{}", msg);
    ConfigError::ValidationError(msg.to_string())
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "users".to_string(),
            username: None,
            password: None,
            user_collection: None,
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MongoConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "users");
        assert_eq!(config.user_collection, None);
        assert_eq!(config.user_collection(), "users");
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.connection_timeout_secs, 5);
    }

    #[test]
    fn test_test_config() {
        let config = MongoConfig::from_test_env();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "test_db");
        assert_eq!(config.user_collection(), "test_users");
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.connection_timeout_secs, 2);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = MongoConfig::from_test_env();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_uri() {
        let mut config = MongoConfig::from_test_env();
        config.uri = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_database() {
        let mut config = MongoConfig::from_test_env();
        config.database = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_pool_size() {
        let mut config = MongoConfig::from_test_env();
        config.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_user_collection() {
        let mut config = MongoConfig::from_test_env();
        config.user_collection = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_username_without_password() {
        let mut config = MongoConfig::from_test_env();
        config.password = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = MongoConfig::from_test_env();
        config.connection_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
