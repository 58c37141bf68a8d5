// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node configuration: loaded from a TOML file, with environment overrides
//! for the handful of values operators need to tweak without editing a
//! file (matching the ambient convention of file-plus-env configuration).

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

fn default_wait_in_new_state_ms() -> u64 {
    1_000
}
fn default_consumer_poll_time_ms() -> u64 {
    200
}
fn default_heartbeat_period_ms() -> u64 {
    5_000
}

/// Durations are configured in milliseconds on the wire (TOML has no native
/// duration type); [`Config`] exposes them as [`Duration`] to callers.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the shared sync topic.
    pub sync_topic_name: String,
    /// Opaque to the in-process bus; kept for interface parity with a real
    /// network log client.
    #[serde(default)]
    pub bootstrap_servers: String,

    /// How long a freshly `INITIATING` task waits, absent a foreign claim,
    /// before attempting its own `CLAIMING`.
    #[serde(default = "default_wait_in_new_state_ms", rename = "wait_in_new_state_ms")]
    wait_in_new_state_ms: u64,

    /// Upper bound on one watcher poll of the sync topic.
    #[serde(default = "default_consumer_poll_time_ms", rename = "consumer_poll_time_ms")]
    consumer_poll_time_ms: u64,

    /// Cadence of the node-wide `DOHEARTBEAT` announcement.
    #[serde(default = "default_heartbeat_period_ms", rename = "heartbeat_period_ms")]
    heartbeat_period_ms: u64,
}

impl Config {
    /// Load configuration from a TOML document, applying `COORD_`-prefixed
    /// environment overrides for the tunable durations.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn default_for_topic(sync_topic_name: impl Into<String>) -> Self {
        Self {
            sync_topic_name: sync_topic_name.into(),
            bootstrap_servers: String::new(),
            wait_in_new_state_ms: default_wait_in_new_state_ms(),
            consumer_poll_time_ms: default_consumer_poll_time_ms(),
            heartbeat_period_ms: default_heartbeat_period_ms(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("COORD_WAIT_IN_NEW_STATE_MS") {
            if let Ok(ms) = v.parse() {
                self.wait_in_new_state_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("COORD_HEARTBEAT_PERIOD_MS") {
            if let Ok(ms) = v.parse() {
                self.heartbeat_period_ms = ms;
            }
        }
    }

    pub fn wait_in_new_state(&self) -> Duration {
        Duration::from_millis(self.wait_in_new_state_ms)
    }

    pub fn consumer_poll_time(&self) -> Duration {
        Duration::from_millis(self.consumer_poll_time_ms)
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("could not read config file {0}: {1}")]
    Read(std::path::PathBuf, #[source] std::io::Error),
}

pub fn load_from_path(path: &std::path::Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    Config::from_toml_str(&text)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
