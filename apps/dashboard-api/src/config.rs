//! Dashboard API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Dashboard API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size for the SQLite connection pool
    pub database_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// Quiet period after a write before the snapshot is recomputed
    pub recompute_coalesce_ms: u64,

    /// Run the weekly demand forecast job
    pub forecast_enabled: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_var("HTTP_PORT", 8080)?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./dealernet.db".to_string()),

            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development only; production MUST set JWT_SECRET
                "dealernet-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", 3600)?, // 1 hour

            recompute_coalesce_ms: parse_var("RECOMPUTE_COALESCE_MS", 50)?,

            forecast_enabled: parse_var("FORECAST_ENABLED", true)?,
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn recompute_coalesce(&self) -> Duration {
        Duration::from_millis(self.recompute_coalesce_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            database_path: "./dealernet.db".to_string(),
            database_max_connections: 5,
            jwt_secret: "dealernet-dev-secret-change-in-production".to_string(),
            jwt_access_lifetime_secs: 3600,
            recompute_coalesce_ms: 50,
            forecast_enabled: true,
        }
    }
}

/// Reads `name`, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default_and_invalid() {
        assert_eq!(parse_var("DEALERNET_TEST_UNSET_VAR", 42u16).unwrap(), 42);

        env::set_var("DEALERNET_TEST_BAD_PORT", "eighty");
        let err = parse_var::<u16>("DEALERNET_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "DEALERNET_TEST_BAD_PORT"));

        env::set_var("DEALERNET_TEST_FLAG", " false ");
        assert!(!parse_var("DEALERNET_TEST_FLAG", true).unwrap());
    }

    #[test]
    fn test_default_coalesce_window() {
        assert_eq!(ApiConfig::default().recompute_coalesce(), Duration::from_millis(50));
    }
}
