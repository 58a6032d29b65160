//! Application configuration.
//!
//! Values come from environment variables (a `.env` file is loaded by the
//! binary before this runs). Missing variables fall back to the defaults of a
//! local sakila installation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, AppResult};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Connection settings for the relational store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database server host.
    #[validate(length(min = 1, message = "Database host is required"))]
    pub host: String,
    /// Database server port.
    #[validate(range(min = 1, message = "Database port must be non-zero"))]
    pub port: u16,
    /// Login user.
    #[validate(length(min = 1, message = "Database user is required"))]
    pub user: String,
    /// Login password.
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Schema to connect to.
    #[validate(length(min = 1, message = "Database name is required"))]
    pub database: String,
    /// Upper bound on pooled connections.
    #[validate(range(min = 1, max = 100, message = "Pool size must be 1-100"))]
    pub max_connections: u32,
    /// Seconds to wait for a connection before giving up.
    #[validate(range(min = 1, message = "Connect timeout must be at least one second"))]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "root".to_string(),
            database: "sakila".to_string(),
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Reads `DB_*` variables over the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("DB_HOST", defaults.host),
            port: env_parse_or("DB_PORT", defaults.port),
            user: env_or("DB_USER", defaults.user),
            password: env_or("DB_PASSWORD", defaults.password),
            database: env_or("DB_NAME", defaults.database),
            max_connections: env_parse_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            connect_timeout_secs: env_parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
        }
    }

    /// Checks the settings, mapping failures to `AppError::Config`.
    pub fn check(&self) -> AppResult<()> {
        self.validate().map_err(|e| AppError::Config(e.to_string()))
    }
}

/// Top-level configuration for a service process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name used in logs.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Directory holding page templates and a `partials/` subdirectory.
    pub templates_dir: PathBuf,
    /// Directory served as static files.
    pub static_dir: PathBuf,
    /// JSON document merged into every page under the `common` key.
    pub common_data_path: PathBuf,
}

impl AppConfig {
    /// Loads the configuration for the named service from the environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", DEFAULT_HOST.to_string()),
            port: env_parse_or("SERVER_PORT", DEFAULT_PORT),
            database: DatabaseConfig::from_env(),
            templates_dir: env_or("TEMPLATES_DIR", "templates".to_string()).into(),
            static_dir: env_or("STATIC_DIR", "public".to_string()).into(),
            common_data_path: env_or("COMMON_DATA_PATH", "data/common.json".to_string()).into(),
        }
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
