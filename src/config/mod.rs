//! Persisted settings
//! Timings and the device name pattern, read from a JSON file and overridable from the
//! command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::bluetooth::{
    BULB_NAME_PATTERN, DEFAULT_BLINK_TIME_MS, DEFAULT_SCAN_TIMEOUT_MS, DEFAULT_SETTLE_INTERVAL_MS,
};

const CONFIG_DIR_NAME: &str = "playbulb";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulbConfig {
    /// Regular expression matched against advertised names
    pub name_pattern: String,

    /// How long to look for the bulb before giving up
    pub scan_timeout_ms: u64,

    /// Delay between writing a color and reading it back
    pub settle_interval_ms: u64,

    /// Pause between the steps of a blink
    pub blink_time_ms: u64,
}

impl Default for BulbConfig {
    fn default() -> Self {
        BulbConfig {
            name_pattern: BULB_NAME_PATTERN.to_string(),
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            settle_interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
            blink_time_ms: DEFAULT_BLINK_TIME_MS,
        }
    }
}

impl BulbConfig {
    /// `<config dir>/playbulb/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from `path`, or from the default location when `path` is `None`.
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub async fn load_config(path: Option<&Path>) -> Result<Self> {
        let Some(file_path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory on this platform, using defaults.");
            return Ok(Self::default());
        };

        if !file_path.exists() {
            debug!("Config file not found at {:?}, using defaults.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(&file_path)
            .await
            .with_context(|| format!("Failed to read config file {:?}", file_path))?;
        let config: Self = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file {:?}", file_path))?;

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Applies command-line values on top of the loaded ones
    pub fn with_overrides(
        mut self,
        scan_timeout_ms: Option<u64>,
        blink_time_ms: Option<u64>,
        name_pattern: Option<String>,
    ) -> Self {
        if let Some(timeout) = scan_timeout_ms {
            self.scan_timeout_ms = timeout;
        }
        if let Some(blink_time) = blink_time_ms {
            self.blink_time_ms = blink_time;
        }
        if let Some(pattern) = name_pattern {
            self.name_pattern = pattern;
        }
        self
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn blink_time(&self) -> Duration {
        Duration::from_millis(self.blink_time_ms)
    }
}
