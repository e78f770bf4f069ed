//! Configuration type definitions

use heapless::String;
use nimbus_protocol::{dictionary_size, Tuple, WeatherKey, MAX_PAYLOAD_SIZE};

use crate::icon::WEATHER_ICONS;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of the synchronised dataset buffer in bytes
pub const SYNC_BUFFER_SIZE: usize = 32;

/// Largest dictionary the phone may send, in bytes
pub const INBOUND_BUFFER_SIZE: usize = 64;

/// Largest dictionary the watch may send, in bytes
pub const OUTBOUND_BUFFER_SIZE: usize = 16;

/// Minutes between forecast requests
pub const REFRESH_INTERVAL_MINUTES: u8 = 15;

/// Maximum temperature text length (without terminator)
pub const MAX_TEMPERATURE_LEN: usize = 15;

/// Smallest outbound buffer that still holds a forecast request
const MIN_OUTBOUND_BUFFER_SIZE: usize = 12;

/// Temperature shown until the phone answers
pub const PLACEHOLDER_TEMPERATURE: &str = "-\u{00B0}C";

/// Icon code shown until the phone answers
pub const PLACEHOLDER_ICON: u8 = 1;

/// How the time is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClockStyle {
    /// "09:05 PM"
    #[default]
    TwelveHour,
    /// "21:05"
    TwentyFourHour,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Inbound buffer is zero or larger than a link frame
    InboundBufferSize,
    /// Outbound buffer cannot hold a forecast request or a link frame
    OutboundBufferSize,
    /// Refresh interval must be 1-60 minutes
    RefreshInterval,
    /// Initial icon code is not in the icon table
    InitialIcon,
    /// Initial dataset does not fit the sync buffer
    InitialDataset,
}

/// Watch-face configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WatchFaceConfig {
    /// Inbound message buffer (bytes)
    pub inbound_buffer_size: u16,
    /// Outbound message buffer (bytes)
    pub outbound_buffer_size: u16,
    /// Minutes between forecast requests
    pub refresh_interval_minutes: u8,
    /// Time format
    pub clock_style: ClockStyle,
    /// Icon code shown before the first update
    pub initial_icon: u8,
    /// Temperature text shown before the first update
    pub initial_temperature: String<MAX_TEMPERATURE_LEN>,
    /// Ask the phone for weather as soon as the face starts
    pub request_on_start: bool,
}

impl Default for WatchFaceConfig {
    fn default() -> Self {
        let mut initial_temperature = String::new();
        // Placeholder is 4 bytes, always fits
        let _ = initial_temperature.push_str(PLACEHOLDER_TEMPERATURE);
        Self {
            inbound_buffer_size: INBOUND_BUFFER_SIZE as u16,
            outbound_buffer_size: OUTBOUND_BUFFER_SIZE as u16,
            refresh_interval_minutes: REFRESH_INTERVAL_MINUTES,
            clock_style: ClockStyle::TwelveHour,
            initial_icon: PLACEHOLDER_ICON,
            initial_temperature,
            request_on_start: true,
        }
    }
}

impl WatchFaceConfig {
    /// The dataset the sync store starts from, in wire order
    pub fn initial_tuples(&self) -> [Tuple<'_>; 2] {
        [
            Tuple::uint8(WeatherKey::Icon, self.initial_icon),
            Tuple::cstring(WeatherKey::Temperature, &self.initial_temperature),
        ]
    }

    /// Check the configuration for values the watch face cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let inbound = self.inbound_buffer_size as usize;
        if inbound == 0 || inbound > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::InboundBufferSize);
        }

        let outbound = self.outbound_buffer_size as usize;
        if !(MIN_OUTBOUND_BUFFER_SIZE..=MAX_PAYLOAD_SIZE).contains(&outbound) {
            return Err(ConfigError::OutboundBufferSize);
        }

        if !(1..=60).contains(&self.refresh_interval_minutes) {
            return Err(ConfigError::RefreshInterval);
        }

        if self.initial_icon as usize >= WEATHER_ICONS.len() {
            return Err(ConfigError::InitialIcon);
        }

        if dictionary_size(&self.initial_tuples()) > SYNC_BUFFER_SIZE {
            return Err(ConfigError::InitialDataset);
        }

        Ok(())
    }
}
