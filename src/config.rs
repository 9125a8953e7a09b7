//! Configuration management for the homebase backend.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Each setting has its own accessor so call sites read
//! like the variable they depend on.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)
//!
//! Required values never panic when missing; they surface as [`ConfigError`].

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::ConfigError, types::UserId};

const APP_DIR: &str = "homebase";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_OWNER: &str = "admin";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Persistence backend used for token records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    File,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "" => Ok(StoreKind::Sqlite),
            "file" | "json" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ConfigError::Invalid {
                name: "TOKEN_STORE".to_string(),
                reason: format!("expected sqlite, file or memory, got '{}'", other),
            }),
        }
    }
}

/// Loads environment variables from `.env` files.
///
/// Looks for `homebase/.env` in the platform-specific local data directory first
/// and then for a `.env` in the current working directory. Missing files are not
/// an error since every variable may also come from the process environment.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/homebase/.env`
/// - macOS: `~/Library/Application Support/homebase/.env`
/// - Windows: `%LOCALAPPDATA%/homebase/.env`
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the data directory cannot be created or an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = app_data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Load(e.to_string())),
    }
}

/// Directory holding the `.env` file, the SQLite database and the token file.
pub fn app_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Address the HTTP API binds to. Reads `SERVER_ADDRESS`.
pub fn server_addr() -> String {
    optional("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Account the HTTP API acts for. Reads `HOMEBASE_OWNER`, defaulting to `admin`.
pub fn owner_id() -> Result<UserId, ConfigError> {
    let raw = optional("HOMEBASE_OWNER").unwrap_or_else(|| DEFAULT_OWNER.to_string());
    UserId::new(raw).map_err(|reason| ConfigError::Invalid {
        name: "HOMEBASE_OWNER".to_string(),
        reason,
    })
}

/// Selected token store backend. Reads `TOKEN_STORE`.
pub fn token_store_kind() -> Result<StoreKind, ConfigError> {
    optional("TOKEN_STORE")
        .map(|raw| raw.parse())
        .unwrap_or(Ok(StoreKind::Sqlite))
}

/// SQLite database path. Reads `DATABASE_PATH`.
pub fn database_path() -> PathBuf {
    optional("DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| app_data_dir().join("website.db"))
}

/// JSON token file path used by the file store. Reads `TOKEN_FILE_PATH`.
pub fn token_file_path() -> PathBuf {
    optional("TOKEN_FILE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| app_data_dir().join("tokens.json"))
}

/// Connect timeout for outgoing provider requests. Reads `HTTP_CONNECT_TIMEOUT_SECS`.
pub fn http_connect_timeout() -> Result<Duration, ConfigError> {
    match optional("HTTP_CONNECT_TIMEOUT_SECS") {
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                name: "HTTP_CONNECT_TIMEOUT_SECS".to_string(),
                reason: e.to_string(),
            }),
        None => Ok(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
    }
}

/// Default tracing filter when `RUST_LOG` is absent. Reads `LOG_LEVEL`.
pub fn log_level() -> String {
    optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string())
}

/// Reads a variable that must be present and non-empty.
///
/// Surrounding quotes are stripped because hand-written `.env` files often
/// carry them.
pub fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::Missing(name.to_string()))
}

/// Reads a variable, treating empty values as absent.
pub fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_parsing() {
        assert_eq!("sqlite".parse::<StoreKind>().unwrap(), StoreKind::Sqlite);
        assert_eq!("JSON".parse::<StoreKind>().unwrap(), StoreKind::File);
        assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!(matches!(
            "redis".parse::<StoreKind>(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn required_reports_missing_variable() {
        let err = required("HOMEBASE_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing("HOMEBASE_TEST_SURELY_UNSET_VARIABLE".to_string())
        );
    }
}
