use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime settings, merged from defaults, an optional `equipviz.toml` and
/// `EQUIPVIZ_`-prefixed environment variables (highest precedence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root directory for the SQLite database and generated reports.
    pub data_dir: PathBuf,
    /// How many history entries survive trimming.
    pub history_limit: i64,
    /// Uploads larger than this are rejected before parsing.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            data_dir: PathBuf::from("data"),
            history_limit: 5,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // A missing .env file is fine, only load it when present.
        let _ = dotenvy::dotenv();

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("equipviz.toml"))
            .merge(Env::prefixed("EQUIPVIZ_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Failed to load configuration: {}", e)))?;

        if config.history_limit <= 0 {
            return Err(AppError::ValidationError(
                "history_limit must be at least 1.".to_string(),
            ));
        }
        if config.max_upload_bytes == 0 {
            return Err(AppError::ValidationError(
                "max_upload_bytes must be greater than 0.".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("equipviz.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.history_limit, 5);
        assert!(config.max_upload_bytes > 0);
    }

    #[test]
    fn test_db_path_lives_under_data_dir() {
        let config = AppConfig::default();
        assert!(config.db_path().starts_with(&config.data_dir));
    }
}
