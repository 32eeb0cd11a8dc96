//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `campushub.toml` (or the path given with `--config`). Every field
//! has a sensible default so the file is optional. Environment variables
//! take precedence over file values.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CAMPUSHUB_DATABASE_URL` | `database.url` |
//! | `CAMPUSHUB_LOG` | `logging.filter` |
//! | `RUST_LOG` | `logging.filter`, wins over `CAMPUSHUB_LOG` when both are set |
//! | `CAMPUSHUB_TOP_DEFECTIVE_LIMIT` | `statistics.top_defective_limit` |

use std::path::Path;
use std::time::Duration;

use campushub_app::handlers::RecomputePolicy;
use campushub_app::services::StatisticsOptions;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// In-process event bus settings.
    pub event_bus: EventBusConfig,
    /// Defect recompute retry settings.
    pub consistency: ConsistencyConfig,
    /// Statistics engine settings.
    pub statistics: StatisticsConfig,
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Buffer of the broadcast channel feeding passive observers.
    pub capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Retries of a recompute hitting a version conflict. `0` gives up on
    /// the first conflict.
    pub max_retries: u32,
    /// Base delay between retries, multiplied by the attempt number.
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Default size of the most-defective-spaces list.
    pub top_defective_limit: usize,
    /// Deadline of a single snapshot or query.
    pub timeout_ms: u64,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting values are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CAMPUSHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("CAMPUSHUB_LOG") {
            self.logging.filter = val;
        }
        // Applied last so RUST_LOG wins over CAMPUSHUB_LOG.
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(limit) = lookup("CAMPUSHUB_TOP_DEFECTIVE_LIMIT").and_then(|v| v.parse().ok()) {
            self.statistics.top_defective_limit = limit;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_bus.capacity == 0 {
            return Err(ConfigError::Validation(
                "event_bus.capacity must be non-zero".to_string(),
            ));
        }
        if self.statistics.top_defective_limit == 0 {
            return Err(ConfigError::Validation(
                "statistics.top_defective_limit must be non-zero".to_string(),
            ));
        }
        if self.statistics.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "statistics.timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy of the defect recompute handler.
    #[must_use]
    pub fn recompute_policy(&self) -> RecomputePolicy {
        RecomputePolicy {
            max_retries: self.consistency.max_retries,
            backoff: Duration::from_millis(self.consistency.backoff_ms),
        }
    }

    #[must_use]
    pub fn statistics_options(&self) -> StatisticsOptions {
        StatisticsOptions {
            top_defective_limit: self.statistics.top_defective_limit,
            timeout: Duration::from_millis(self.statistics.timeout_ms),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:campushub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "campushubd=info,campushub_app=info".to_string(),
        }
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 20,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            top_defective_limit: 10,
            timeout_ms: 5_000,
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
