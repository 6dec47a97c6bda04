//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where todos are kept. Chosen once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

/// Connection pool settings for the relational backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    /// Deadline for acquiring a connection for one request.
    pub timeout: Duration,
}

/// GitHub OAuth application credentials.
#[derive(Clone, Debug)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// No timeout is applied to GitHub calls when unset.
    pub http_timeout: Option<Duration>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage: StorageBackend,
    pub database: DatabaseSettings,
    pub github: GitHubConfig,
    pub cors_origin: String,
    pub cookie_secure: bool,
    pub login_redirect: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:8080");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage Settings ---
        let backend_str = var_or("STORAGE_BACKEND", "memory");
        let storage = match backend_str.trim().to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "postgres" | "relational" | "supabase" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("unsupported repository type '{}'", other),
                ))
            }
        };

        let database = DatabaseSettings {
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            timeout: Duration::from_secs(parse_var(&lookup, "DATABASE_TIMEOUT_SECS", 5)?),
        };

        // --- GitHub OAuth Settings ---
        let http_timeout = match lookup("GITHUB_HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("GITHUB_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?)),
            None => None,
        };
        let github = GitHubConfig {
            client_id: var_or("GITHUB_CLIENT_ID", ""),
            client_secret: var_or("GITHUB_CLIENT_SECRET", ""),
            redirect_url: var_or(
                "GITHUB_REDIRECT_URL",
                "http://localhost:8080/auth/github/callback",
            ),
            http_timeout,
        };

        // --- Web Settings ---
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:8080");
        let cookie_secure = parse_var(&lookup, "COOKIE_SECURE", false)?;
        let login_redirect = var_or("LOGIN_REDIRECT", "/todos");

        Ok(Self {
            bind_address,
            log_level,
            storage,
            database,
            github,
            cors_origin,
            cookie_secure,
            login_redirect,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
