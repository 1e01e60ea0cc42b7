use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

const JWT_SECRET_ENV: &str = "PM_JWT_SECRET";
const RESUME_PARSER_URL_ENV: &str = "PM_RESUME_PARSER_URL";

const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;
const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_RESUME_PARSER_URL: &str = "http://127.0.0.1:8001/parse";
// The resume parser is the one external collaborator with an explicit
// timeout; parsing large documents can legitimately take minutes.
const DEFAULT_RESUME_PARSER_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub max_upload_size_bytes: usize,
    pub resume_parser_url: String,
    pub resume_parser_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: generate_secret(),
            token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            resume_parser_url: DEFAULT_RESUME_PARSER_URL.to_string(),
            resume_parser_timeout_secs: DEFAULT_RESUME_PARSER_TIMEOUT_SECS,
        }
    }
}

impl Config {
    fn from_raw(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Invalid config file, falling back to defaults: {}", err);
                Self::default()
            }
        }
    }

    /// Environment variables win over whatever the file says.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            let secret = secret.trim();
            if !secret.is_empty() {
                self.jwt_secret = secret.to_string();
            }
        }
        if let Ok(url) = std::env::var(RESUME_PARSER_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.resume_parser_url = url.to_string();
            }
        }
        self
    }
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Will always return config, falling back to defaults on missing/invalid
/// files.
pub async fn load_config_from_file(config_path: &PathBuf) -> Config {
    let config = match std::fs::read_to_string(config_path) {
        Ok(raw_config) => Config::from_raw(&raw_config),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!("No config file found, creating one");
            } else {
                tracing::warn!("Failed to read config file: {}", err);
            }
            Config::default()
        }
    };
    config.with_env_overrides()
}

pub async fn save_config_to_file(config: &Config, config_path: &PathBuf) -> Result<(), ConfigError> {
    let raw_config = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path, raw_config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_raw_config_falls_back_to_defaults() {
        let config = Config::from_raw("{not json");
        assert_eq!(config.token_expiry_hours, DEFAULT_TOKEN_EXPIRY_HOURS);
        assert_eq!(config.max_upload_size_bytes, DEFAULT_MAX_UPLOAD_SIZE_BYTES);
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config = Config::from_raw(r#"{"token_expiry_hours": 8}"#);
        assert_eq!(config.token_expiry_hours, 8);
        assert_eq!(config.resume_parser_url, DEFAULT_RESUME_PARSER_URL);
    }
}
