//! Environment variable handling and .env file loading

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory if it exists
    ///
    /// Values already present in the environment are kept, so the file only
    /// fills gaps. Returns whether a file was loaded.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "REDIS_SERVER" => {
                if value.trim().is_empty() {
                    return Err(AppError::config("REDIS_SERVER cannot be empty"));
                }
            }
            "REDIS_PORT" => {
                let port: u16 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REDIS_PORT value '{}': {}", value, e)))?;
                if port == 0 {
                    return Err(AppError::config("REDIS_PORT must be between 1 and 65535"));
                }
            }
            "REDIS_WRITES" => {
                let writes: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REDIS_WRITES value '{}': {}", value, e)))?;
                if writes > crate::defaults::MAX_JOB_COUNT {
                    return Err(AppError::config(format!(
                        "REDIS_WRITES must be at most {}, got: {}",
                        crate::defaults::MAX_JOB_COUNT,
                        writes
                    )));
                }
            }
            "REDIS_CLIENTS" => {
                let clients: usize = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REDIS_CLIENTS value '{}': {}", value, e)))?;
                if clients == 0 {
                    return Err(AppError::config("REDIS_CLIENTS must be at least 1"));
                }
            }
            "REDIS_RATE_LIMIT" => {
                let rate: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REDIS_RATE_LIMIT value '{}': {}", value, e)))?;
                if rate == 0 {
                    return Err(AppError::config("REDIS_RATE_LIMIT must be at least 1"));
                }
            }
            "REDIS_LOGFILE" | "REDIS_OUTFILE" => {
                if value.trim().is_empty() {
                    return Err(AppError::config(format!("{} cannot be empty", key)));
                }
            }
            _ => {
                // Unknown or free-form variable (REDIS_PASSWORD), nothing to check
            }
        }

        Ok(())
    }

    /// Environment variables read as flag fallbacks
    pub fn get_supported_env_vars() -> Vec<&'static str> {
        vec![
            "REDIS_SERVER",
            "REDIS_PORT",
            "REDIS_PASSWORD",
            "REDIS_WRITES",
            "REDIS_CLIENTS",
            "REDIS_RATE_LIMIT",
            "REDIS_LOGFILE",
            "REDIS_OUTFILE",
        ]
    }

    /// Check every supported variable that is set; returns one warning per problem
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|name| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| e.to_string())
            })
            .collect()
    }
}
