//! Bulb commands
//! This module defines the commands the tool accepts and the immutable invocation they run with.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use regex::Regex;

use crate::config::BulbConfig;
use crate::core::color::ColorSource;
use crate::error::BulbError;

pub const USAGE: &str =
    "Usage: playbulb [command] [options] \n command is one of: \n  - change\n  - blink";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the bulb to the requested color
    Change,
    /// Flash the requested color twice, then restore the original one
    Blink,
}

impl FromStr for Command {
    type Err = BulbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" => Ok(Self::Change),
            "blink" => Ok(Self::Blink),
            _ => Err(BulbError::Usage(USAGE.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Change => "change",
            Self::Blink => "blink",
        })
    }
}

/// Everything one run needs, fixed before the radio is touched
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Command,
    pub color: ColorSource,
    pub name_pattern: Regex,
    pub scan_timeout: Duration,
    pub settle_interval: Duration,
    pub blink_time: Duration,
}

impl Invocation {
    /// Validates the command and name pattern and resolves the color
    pub fn new(
        command: Option<&str>,
        color: Option<&str>,
        config: &BulbConfig,
    ) -> Result<Self, BulbError> {
        let command = command
            .ok_or_else(|| BulbError::Usage(USAGE.to_string()))
            .and_then(str::parse::<Command>)
            .inspect_err(|_| warn!("{}", USAGE))?;

        let name_pattern = Regex::new(&config.name_pattern).map_err(|e| {
            BulbError::Usage(format!("invalid name pattern {:?}: {}", config.name_pattern, e))
        })?;

        Ok(Self {
            command,
            color: ColorSource::resolve(color),
            name_pattern,
            scan_timeout: config.scan_timeout(),
            settle_interval: config.settle_interval(),
            blink_time: config.blink_time(),
        })
    }
}
