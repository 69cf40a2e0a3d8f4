//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `assetcycle.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.
//!
//! Lifecycle thresholds are not configured here: they live in the database
//! and are managed through the lifecycle API.

use std::time::Duration;

use assetcycle_app::lifecycle::SchedulerSettings;
use assetcycle_domain::lifecycle::MAX_LOOKAHEAD_DAYS;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Background run settings.
    pub scheduler: SchedulerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Lifecycle scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the full cycle periodically in the background.
    pub enabled: bool,
    /// Seconds between scheduled runs.
    pub interval_secs: u64,
    /// Quiet period after a completed run, in seconds.
    pub cooldown_secs: u64,
    /// Hard ceiling on a single run, in seconds.
    pub timeout_secs: u64,
    /// Candidates transitioned per chunk.
    pub chunk_size: usize,
    /// How long shutdown waits for an in-flight run, in seconds.
    pub shutdown_grace_secs: u64,
    /// Default window of the "upcoming disposals" statistic.
    pub stats_lookahead_days: u32,
    /// Audit actor recorded for runs without a caller.
    pub actor: String,
}

impl Config {
    /// Load configuration from `assetcycle.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("assetcycle.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ASSETCYCLE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ASSETCYCLE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ASSETCYCLE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("ASSETCYCLE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("ASSETCYCLE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        let scheduler = &self.scheduler;
        if scheduler.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.interval_secs must be non-zero".to_string(),
            ));
        }
        if scheduler.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.timeout_secs must be non-zero".to_string(),
            ));
        }
        if scheduler.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "scheduler.chunk_size must be non-zero".to_string(),
            ));
        }
        if scheduler.stats_lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ConfigError::Validation(format!(
                "scheduler.stats_lookahead_days must not exceed {MAX_LOOKAHEAD_DAYS}"
            )));
        }
        if scheduler.actor.trim().is_empty() {
            return Err(ConfigError::Validation(
                "scheduler.actor must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl SchedulerConfig {
    /// Settings handed to the lifecycle scheduler.
    #[must_use]
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            cooldown: Duration::from_secs(self.cooldown_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            actor: self.actor.trim().to_string(),
            chunk_size: self.chunk_size,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:assetcycle.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "assetcycled=info,assetcycle=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 86_400,
            cooldown_secs: 60,
            timeout_secs: 600,
            chunk_size: 100,
            shutdown_grace_secs: 30,
            stats_lookahead_days: 30,
            actor: "system".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
