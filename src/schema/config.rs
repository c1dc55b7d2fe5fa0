//! Configuration types for the animation engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_tick_interval_ms() -> u64 {
    33
}

fn default_true() -> bool {
    true
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the playback tick in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Spawn the playback worker when the engine is created.
    #[serde(default = "default_true")]
    pub auto_start_scheduler: bool,
    /// Initialize the backend on first play/stop/query instead of at startup.
    #[serde(default = "default_true")]
    pub lazy_init: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_start_scheduler: true,
            lazy_init: true,
        }
    }
}

impl EngineConfig {
    /// Tick period as a [`Duration`].
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        if self.tick_interval_ms > 1000 {
            return Err(ConfigError::TickIntervalTooLong(self.tick_interval_ms));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Tick interval must be non-zero")]
    InvalidTickInterval,
    #[error("Tick interval of {0} ms is longer than the shortest frame")]
    TickIntervalTooLong(u64),
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}
