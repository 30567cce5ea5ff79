//! Shop API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults.

use std::env;

/// Shop API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("SHOP_API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHOP_API_PORT".to_string()))?,

            database_path: env::var("SHOP_DB_PATH")
                .unwrap_or_else(|_| "data/voltpos.db".to_string()),
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only meaningful when the env vars are unset, which is the normal
        // test environment.
        if env::var("SHOP_API_PORT").is_err() && env::var("SHOP_DB_PATH").is_err() {
            let config = ApiConfig::load().unwrap();
            assert_eq!(config.http_port, 8080);
            assert_eq!(config.database_path, "data/voltpos.db");
        }
    }
}
