//! Configuration module for the scout backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default number of candidates pulled from the directory per session.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file backing the roster
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the developer directory API
    pub directory_url: String,
    /// Maximum number of candidates kept from one directory batch
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SCOUT_API_PSK").ok();

        let db_path = env::var("SCOUT_DB_PATH")
            .unwrap_or_else(|_| "./data/roster.sqlite".to_string())
            .into();

        let bind_addr = env::var("SCOUT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SCOUT_BIND_ADDR format: {}", e)))?;

        let log_level = env::var("SCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let directory_url = env::var("SCOUT_DIRECTORY_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());

        let batch_size = match env::var("SCOUT_BATCH_SIZE") {
            Ok(raw) => parse_batch_size(&raw)?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            directory_url,
            batch_size,
        })
    }
}

fn parse_batch_size(raw: &str) -> Result<usize, AppError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(AppError::Config(
            "SCOUT_BATCH_SIZE must be at least 1".to_string(),
        )),
        Ok(size) => Ok(size),
        Err(e) => Err(AppError::Config(format!(
            "Invalid SCOUT_BATCH_SIZE '{}': {}",
            raw, e
        ))),
    }
}
