//! Periodic refresh scheduler
//!
//! Decides, from the wall-clock minute alone, whether a forecast request
//! is due. There is no timer state: the caller delivers one tick per
//! minute and asks. Duplicate ticks for the same minute fire again, which
//! is harmless because the sync store drops unchanged replies.

use crate::config::REFRESH_INTERVAL_MINUTES;

/// Minute-boundary refresh trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshScheduler {
    interval_minutes: u8,
}

impl RefreshScheduler {
    /// Fire every `interval_minutes` minutes past the hour
    ///
    /// Zero is treated as one.
    pub const fn new(interval_minutes: u8) -> Self {
        Self {
            interval_minutes: if interval_minutes == 0 {
                1
            } else {
                interval_minutes
            },
        }
    }

    pub const fn interval_minutes(&self) -> u8 {
        self.interval_minutes
    }

    /// True if a refresh is due at this minute of the hour (0-59)
    pub const fn should_refresh(&self, minute_of_hour: u8) -> bool {
        minute_of_hour % self.interval_minutes == 0
    }

    /// Same as `should_refresh`, from minutes since the epoch
    pub const fn should_refresh_at(&self, minutes_since_epoch: u64) -> bool {
        self.should_refresh(minute_of_hour(minutes_since_epoch))
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(REFRESH_INTERVAL_MINUTES)
    }
}

/// Minute of the hour for a count of minutes since the epoch
pub const fn minute_of_hour(minutes_since_epoch: u64) -> u8 {
    (minutes_since_epoch % 60) as u8
}
