use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level broker configuration, deserializable from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub engine: EngineConfig,
    pub scheduler: SchedulerConfig,
}

/// Engine-wide defaults applied when a call does not override them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_ack_timeout_ms: u64,
    pub default_max_attempts: u32,
}

/// Scheduler thread configuration (channel capacity, idle tick).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub command_channel_capacity: usize,
    /// How long the scheduler parks without commands before running a
    /// background lease reclamation pass.
    pub idle_timeout_ms: u64,
}

impl EngineConfig {
    /// Default lease length: 30 seconds.
    pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn default_ack_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ack_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ack_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine.default_ack_timeout_ms must be positive".into(),
            ));
        }
        if self.default_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "engine.default_max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ack_timeout_ms: Self::DEFAULT_ACK_TIMEOUT_MS,
            default_max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command_channel_capacity: 10_000,
            idle_timeout_ms: 100,
        }
    }
}

impl BrokerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BrokerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.scheduler.command_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.command_channel_capacity must be positive".into(),
            ));
        }
        if self.scheduler.idle_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.idle_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}
