//! Time text for the watch face

use core::fmt::Write;

use heapless::String;

use crate::config::ClockStyle;

/// Longest time text ("12:00 AM")
pub const TIME_TEXT_LEN: usize = 8;

/// Wall-clock time of day, minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallTime {
    hour: u8,
    minute: u8,
}

impl WallTime {
    /// `None` unless hour < 24 and minute < 60
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Time of day for a count of minutes since midnight of the epoch
    pub const fn from_minutes(minutes_since_epoch: u64) -> Self {
        let of_day = minutes_since_epoch % (24 * 60);
        Self {
            hour: (of_day / 60) as u8,
            minute: (of_day % 60) as u8,
        }
    }

    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }
}

/// Format a time the way the face shows it
pub fn format_time(time: WallTime, style: ClockStyle) -> String<TIME_TEXT_LEN> {
    let mut text = String::new();
    // Longest output is 8 bytes, the capacity
    let _ = match style {
        ClockStyle::TwentyFourHour => write!(text, "{:02}:{:02}", time.hour, time.minute),
        ClockStyle::TwelveHour => {
            let hour = match time.hour % 12 {
                0 => 12,
                h => h,
            };
            let suffix = if time.hour < 12 { "AM" } else { "PM" };
            write!(text, "{:02}:{:02} {}", hour, time.minute, suffix)
        }
    };
    text
}
