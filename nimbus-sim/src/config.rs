//! Simulator configuration
//!
//! Read from an optional TOML file. Every section and key may be left
//! out; missing values take their defaults.

use std::fs;
use std::path::Path;

use log::*;
use nimbus_core::config::WatchFaceConfig;
use serde::Deserialize;

/// Simulated clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Real milliseconds per simulated minute
    pub minute_ms: u64,
    /// Minutes past midnight at startup
    pub start_minute: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            minute_ms: 1000,
            start_minute: 21 * 60 + 10,
        }
    }
}

/// Simulated phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// Delay before answering a forecast request
    pub latency_ms: u64,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self { latency_ms: 250 }
    }
}

/// Complete simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub watchface: WatchFaceConfig,
    pub clock: ClockConfig,
    pub phone: PhoneConfig,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum LoadError {
    /// File could not be read
    Io(std::io::Error),
    /// TOML parsing failed
    Parse(toml::de::Error),
    /// Watch-face values rejected
    Invalid(nimbus_core::ConfigError),
    /// A simulated minute must last at least 1 ms
    MinuteLength,
}

/// Load the configuration file, or the defaults if none is given
pub fn load(path: Option<&Path>) -> Result<SimConfig, LoadError> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return check(SimConfig::default());
    };

    info!("Loading configuration from {}", path.display());
    let text = fs::read_to_string(path).map_err(LoadError::Io)?;
    parse(&text)
}

/// Parse and check TOML text
pub fn parse(text: &str) -> Result<SimConfig, LoadError> {
    let config: SimConfig = toml::from_str(text).map_err(LoadError::Parse)?;
    check(config)
}

fn check(config: SimConfig) -> Result<SimConfig, LoadError> {
    config.watchface.validate().map_err(LoadError::Invalid)?;
    if config.clock.minute_ms == 0 {
        return Err(LoadError::MinuteLength);
    }
    Ok(config)
}
