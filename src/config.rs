use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::PhysiqueError;
use crate::models::Gender;

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scan store settings
    pub database: DatabaseConfig,
    /// Log output settings
    pub logging: LoggingConfig,
    /// Analysis protocol settings
    pub analysis: AnalysisConfig,
}

/// Scan store settings, including the bounded retry policy for busy databases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite:` path, bare path, or `:memory:`
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub connection_timeout_secs: u64,
    /// SQLite busy handler timeout
    pub busy_timeout_ms: u64,
    /// Retries after SQLITE_BUSY / SQLITE_LOCKED
    pub max_retries: u32,
    /// Backoff step between retries (linear)
    pub retry_backoff_ms: u64,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Optional rolling log file
    pub file_path: Option<String>,
    /// "json" or "text"
    pub format: String,
}

/// Analysis protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Prefix of the per-gender demo identity (`<prefix>_<gender>`)
    pub demo_user_prefix: String,
    /// Default number of scans returned by history queries
    pub history_limit: usize,
    /// Average visibility a pose needs to pass the quality gate
    pub min_visibility: f64,
    /// Attach diet plan and workout routine to analysis reports
    pub include_plans: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/physique.db".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
            busy_timeout_ms: 5000,
            max_retries: 3,
            retry_backoff_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            demo_user_prefix: "demo_user".to_string(),
            history_limit: 10,
            min_visibility: 0.5,
            include_plans: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // PHYSIQUE__DATABASE__MAX_RETRIES=5
            .add_source(
                Environment::with_prefix("PHYSIQUE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(PhysiqueError::InvalidConfig("database url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(PhysiqueError::InvalidConfig("max_connections must be greater than 0".to_string()));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(PhysiqueError::InvalidConfig("connection_timeout_secs must be greater than 0".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(PhysiqueError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(PhysiqueError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            )));
        }

        if self.analysis.demo_user_prefix.trim().is_empty() {
            return Err(PhysiqueError::InvalidConfig("demo_user_prefix must not be empty".to_string()));
        }
        if self.analysis.history_limit == 0 {
            return Err(PhysiqueError::InvalidConfig("history_limit must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.analysis.min_visibility) {
            return Err(PhysiqueError::InvalidConfig(format!(
                "min_visibility must be within 0..=1, got {}",
                self.analysis.min_visibility
            )));
        }

        Ok(())
    }

    /// Get database URL from environment or config
    #[must_use]
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl AnalysisConfig {
    /// Demo identity for a gender, e.g. `demo_user_male`
    #[must_use]
    pub fn demo_user_id(&self, gender: Gender) -> String {
        format!("{}_{}", self.demo_user_prefix, gender.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "sqlite:data/physique.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.analysis.history_limit, 10);
        assert_eq!(config.analysis.demo_user_id(Gender::NonBinary), "demo_user_non-binary");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analysis.min_visibility = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PhysiqueError::InvalidConfig(ref msg) if msg.contains("min_visibility")));
    }
}
