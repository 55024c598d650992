//! Configuration management for the Baufi server
//!
//! This module handles loading and validating configuration from environment variables.
//! A `.env` file in the working directory is honoured when present.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::db::DbSettings;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub db_path: PathBuf,

    /// Address the HTTP server binds to
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log every statement and its parameters before execution
    pub log_db_queries: bool,

    /// Maximum open database connections
    pub db_max_connections: u32,

    /// Connections kept open while idle
    pub db_max_idle_connections: u32,

    /// Directory holding the built UI assets
    pub static_dir: PathBuf,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests feed a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/loans.db"));

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_db_queries = lookup("LOG_DB_QUERIES").as_deref() == Some("true");

        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "25".to_string())
            .parse::<u32>()
            .unwrap_or(25);

        let db_max_idle_connections = lookup("DB_MAX_IDLE_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .unwrap_or(5);

        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }
        if db_max_idle_connections > db_max_connections {
            return Err(ConfigError::InvalidValue(format!(
                "DB_MAX_IDLE_CONNECTIONS ({}) cannot exceed DB_MAX_CONNECTIONS ({})",
                db_max_idle_connections, db_max_connections
            )));
        }

        let static_dir = lookup("STATIC_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./static"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|s| !s.is_empty());

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            db_path,
            host,
            port,
            log_db_queries,
            db_max_connections,
            db_max_idle_connections,
            static_dir,
            cors_allowed_origins,
            log_level,
        })
    }

    /// Settings handed to the database layer
    pub fn db_settings(&self) -> DbSettings {
        DbSettings {
            path: self.db_path.clone(),
            max_connections: self.db_max_connections,
            max_idle_connections: self.db_max_idle_connections,
            log_queries: self.log_db_queries,
        }
    }
}
