//! Miner driver configuration
//!
//! Stored as JSON. Durations use humantime strings (`"15s"`, `"1ms"`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha3_miner_core::RegisterLayout;

use crate::error::ConfigError;

/// Starting nonce used by the reference host program
pub const DEFAULT_INITIAL_NONCE: u32 = 1;

/// Comparison threshold used by the reference host program
pub const DEFAULT_TARGET: u32 = 1_000_000_005;

/// Wall-clock budget for one mining run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval between STATUS polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// First nonce to try
    pub initial_nonce: u32,
    /// A nonce wins when its hash is strictly below this value
    pub target: u32,
    /// Give up and stop the miner after this long
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Sleep between STATUS reads
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Log a status line every N polls
    pub status_report_every: u32,
    /// Register offset layout exposed by the device
    pub layout: RegisterLayout,
    /// Simulated clock: ticks run per lock acquisition while mining
    pub ticks_per_slice: u32,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            initial_nonce: DEFAULT_INITIAL_NONCE,
            target: DEFAULT_TARGET,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_report_every: 100,
            layout: RegisterLayout::Canonical,
            ticks_per_slice: 4096,
        }
    }
}

impl MinerConfig {
    /// Load a config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Get the default config file path
#[cfg(feature = "cli")]
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".sha3-miner").join("config.json")
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(path.to_path_buf())
}
