//! Recovery configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration file.

use crate::core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Timing of the polling engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub error_timeout_secs: f64,
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            error_timeout_secs: 90.0,
            poll_interval_ms: 50,
        }
    }
}

impl EngineConfig {
    /// Negative or non-finite values clamp to zero.
    pub fn error_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.error_timeout_secs).unwrap_or(Duration::ZERO)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Physical limits used by the recovery guards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Drive voltage (V) above which the fault is treated as live.
    pub voltage_fault: f64,
    /// Drive voltage (V) below which a reference counts as zeroed.
    pub voltage_zero: f64,
    /// Position error above which an axis is considered not tracking.
    pub position_error: f64,
    /// Pause after a reset pulse before checking its effect.
    pub reset_settle_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            voltage_fault: 0.5,
            voltage_zero: 0.1,
            position_error: 0.01,
            reset_settle_ms: 200,
        }
    }
}

impl Thresholds {
    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }
}

/// Starting point for the simulated mount.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Initial point values, overriding the chosen preset.
    pub initial: BTreeMap<String, Value>,
    /// Points that ignore commands.
    pub stuck: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub engine: EngineConfig,
    pub thresholds: Thresholds,
    pub simulation: SimulationConfig,
}

impl RecoveryConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
