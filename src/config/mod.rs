//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;

/// Prefix for environment overrides, e.g. `MATCH_NOTES__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "MATCH_NOTES";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Master-data cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long note-type rows stay cached, e.g. "10m"
    #[serde(default = "default_note_type_ttl")]
    pub note_type_ttl: String,
}

fn default_note_type_ttl() -> String {
    "10m".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            note_type_ttl: default_note_type_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn note_type_ttl(&self) -> Option<Duration> {
        parse_duration(&self.note_type_ttl)
    }
}

/// Statistics endpoint limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_opponent_limit")]
    pub default_opponent_limit: usize,

    #[serde(default = "default_max_opponent_limit")]
    pub max_opponent_limit: usize,
}

fn default_opponent_limit() -> usize {
    crate::calculate::DEFAULT_OPPONENT_LIMIT
}

fn default_max_opponent_limit() -> usize {
    200
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_opponent_limit: default_opponent_limit(),
            max_opponent_limit: default_max_opponent_limit(),
        }
    }
}

impl StatsConfig {
    /// Requested limit, defaulted and clamped to `1..=max_opponent_limit`.
    pub fn opponent_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_opponent_limit)
            .clamp(1, self.max_opponent_limit)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Layered load: built-in defaults, then the TOML file if it exists,
    /// then `MATCH_NOTES__*` environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, in the layout `load` reads.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        match self.cache.note_type_ttl() {
            Some(ttl) if !ttl.is_zero() => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid note type TTL: {:?}",
                    self.cache.note_type_ttl
                )))
            }
        }

        if self.stats.max_opponent_limit == 0
            || self.stats.default_opponent_limit == 0
            || self.stats.default_opponent_limit > self.stats.max_opponent_limit
        {
            return Err(ConfigError::ValidationError(
                "Opponent limits must be positive and default <= max".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.note_type_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.stats.default_opponent_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_ttl() {
        let mut config = AppConfig::default();
        config.cache.note_type_ttl = "soon".to_string();
        assert!(config.validate().is_err());

        config.cache.note_type_ttl = "0s".to_string();
        assert!(config.validate().is_err());

        config.cache.note_type_ttl = "18446744073709551615h".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_validation_bad_limits() {
        let mut config = AppConfig::default();
        config.stats.default_opponent_limit = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_opponent_limit_clamp() {
        let stats = StatsConfig::default();
        assert_eq!(stats.opponent_limit(None), 50);
        assert_eq!(stats.opponent_limit(Some(0)), 1);
        assert_eq!(stats.opponent_limit(Some(10_000)), 200);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/var/lib/match-notes"

[server]
port = 9000

[cache]
note_type_ttl = "30s"
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/match-notes"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cache.note_type_ttl(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_rendered_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.server.port = 9100;
        config.stats.default_opponent_limit = 20;

        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        assert_eq!(loaded.server.port, 9100);
        assert_eq!(loaded.stats.default_opponent_limit, 20);
        assert_eq!(loaded.cache.note_type_ttl, config.cache.note_type_ttl);
    }
}
