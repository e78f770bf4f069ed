//! Dictionary keys understood by the watch face

use crate::dictionary::TupleType;

/// Keys of the weather dictionary
///
/// These numbers are shared with the phone app and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum WeatherKey {
    /// Weather icon code (u8, 0-3)
    Icon = 0,
    /// Temperature text including unit suffix (C string)
    Temperature = 1,
    /// Forecast request flag, 1 asks the phone for fresh data (integer)
    ForecastRequest = 2,
}

// Wire format values
const KEY_ICON: u32 = 0;
const KEY_TEMPERATURE: u32 = 1;
const KEY_FORECAST_REQUEST: u32 = 2;

impl WeatherKey {
    /// All keys, in wire order
    pub const ALL: [WeatherKey; 3] = [
        WeatherKey::Icon,
        WeatherKey::Temperature,
        WeatherKey::ForecastRequest,
    ];

    /// Parse a key from its wire value
    pub fn from_u32(key: u32) -> Option<Self> {
        match key {
            KEY_ICON => Some(WeatherKey::Icon),
            KEY_TEMPERATURE => Some(WeatherKey::Temperature),
            KEY_FORECAST_REQUEST => Some(WeatherKey::ForecastRequest),
            _ => None,
        }
    }

    /// Convert to wire value
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    /// Value type the phone uses for this key
    pub fn value_type(self) -> TupleType {
        match self {
            WeatherKey::Icon => TupleType::Uint,
            WeatherKey::Temperature => TupleType::CString,
            WeatherKey::ForecastRequest => TupleType::Int,
        }
    }
}

impl From<WeatherKey> for u32 {
    fn from(key: WeatherKey) -> Self {
        key.to_u32()
    }
}
